use std::fmt;

/// One of the two analog inputs of the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    One,
    Two,
}

impl Channel {
    /// Both channels in acquisition order
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "CHAN1",
            Self::Two => "CHAN2",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(other),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SCPI directive or query, sent verbatim without a line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command(&'static str);

impl Command {
    pub const IDENTIFY: Self = Self("*IDN?");
    pub const RESET: Self = Self("*RST");
    pub const TIME_SCALE: Self = Self(":TIM:SCAL?");
    pub const TIME_OFFSET: Self = Self(":TIM:OFFS?");

    /// Any other SCPI string, e.g. `:RUN`, `:STOP` or `:KEY:FORCE`
    pub const fn new(text: &'static str) -> Self {
        Self(text)
    }

    /// Volts per division of `channel`
    pub fn channel_scale(channel: Channel) -> Self {
        match channel {
            Channel::One => Self(":CHAN1:SCAL?"),
            Channel::Two => Self(":CHAN2:SCAL?"),
        }
    }

    /// Vertical offset of `channel` in volts
    pub fn channel_offset(channel: Channel) -> Self {
        match channel {
            Channel::One => Self(":CHAN1:OFFS?"),
            Channel::Two => Self(":CHAN2:OFFS?"),
        }
    }

    /// Raw sample bytes currently on screen for `channel`
    pub fn waveform_data(channel: Channel) -> Self {
        match channel {
            Channel::One => Self(":WAV:DATA? CHAN1"),
            Channel::Two => Self(":WAV:DATA? CHAN2"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_queries() {
        assert_eq!(Command::channel_scale(Channel::One).as_str(), ":CHAN1:SCAL?");
        assert_eq!(Command::channel_offset(Channel::Two).as_str(), ":CHAN2:OFFS?");
        assert_eq!(Command::waveform_data(Channel::Two).as_str(), ":WAV:DATA? CHAN2");
    }

    #[test]
    fn test_commands_have_no_terminator() {
        assert_eq!(Command::IDENTIFY.as_bytes(), b"*IDN?");
        assert_eq!(Command::RESET.as_bytes(), b"*RST");
    }

    #[test]
    fn test_custom_command() {
        const FORCE: Command = Command::new(":KEY:FORCE");
        assert_eq!(FORCE.as_bytes(), b":KEY:FORCE");
        assert_eq!(FORCE.to_string(), ":KEY:FORCE");
    }

    #[test]
    fn test_channel_from_number() {
        assert_eq!(Channel::try_from(1), Ok(Channel::One));
        assert_eq!(Channel::try_from(2), Ok(Channel::Two));
        assert_eq!(Channel::try_from(3), Err(3));
        assert_eq!(Channel::Two.number(), 2);
    }
}
