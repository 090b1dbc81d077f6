use crate::command::{Channel, Command};
use crate::instrument::InstrumentChannel;
use crate::transport::{Transport, TransportError};

/// Longest numeric reply the scope sends for a scale or offset query
pub const NUMERIC_REPLY_LEN: usize = 20;

/// Number of points on screen, shared by the time axis and the waveform window
pub const WINDOW_LEN: usize = 600;

/// Horizontal grid points per time division
const POINTS_PER_DIVISION: f64 = 50.0;

/// Vertical divisions above and below the channel offset
const HALF_SCREEN_DIVISIONS: f64 = 4.0;

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("Could not parse {quantity} from reply {reply:?}")]
    Parse { quantity: &'static str, reply: String },

    #[error("Instrument reported a zero or out of range {quantity}")]
    Invalid { quantity: &'static str },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Scale and offset of one axis, as reported by the scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCalibration {
    /// Units per division, never zero
    pub scale: f64,
    pub offset: f64,
}

impl ChannelCalibration {
    /// Vertical range a plot needs to show the whole screen of this channel
    pub fn display_range(&self) -> (f64, f64) {
        (
            -HALF_SCREEN_DIVISIONS * self.scale - self.offset,
            HALF_SCREEN_DIVISIONS * self.scale - self.offset,
        )
    }
}

/// One consistent snapshot of every scale and offset the decoder depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
    pub channel1: ChannelCalibration,
    pub channel2: ChannelCalibration,
    pub time: ChannelCalibration,
}

impl CalibrationParams {
    /// Query all six values from the scope.
    ///
    /// The queries go out in a fixed order: channel 1 scale and offset,
    /// channel 2 scale and offset, then time scale and offset. Nothing is
    /// returned unless every reply parses and every scale is a normal, non-zero
    /// number.
    pub fn query<T: Transport>(channel: &mut InstrumentChannel<T>) -> Result<Self, CalibrationError> {
        let channel1 = query_axis(
            channel,
            Command::channel_scale(Channel::One),
            Command::channel_offset(Channel::One),
            ("channel 1 scale", "channel 1 offset"),
        )?;
        let channel2 = query_axis(
            channel,
            Command::channel_scale(Channel::Two),
            Command::channel_offset(Channel::Two),
            ("channel 2 scale", "channel 2 offset"),
        )?;
        let time = query_axis(
            channel,
            Command::TIME_SCALE,
            Command::TIME_OFFSET,
            ("time scale", "time offset"),
        )?;

        Ok(Self {
            channel1,
            channel2,
            time,
        })
    }

    pub fn channel(&self, channel: Channel) -> &ChannelCalibration {
        match channel {
            Channel::One => &self.channel1,
            Channel::Two => &self.channel2,
        }
    }
}

fn query_axis<T: Transport>(
    channel: &mut InstrumentChannel<T>,
    scale_command: Command,
    offset_command: Command,
    (scale_name, offset_name): (&'static str, &'static str),
) -> Result<ChannelCalibration, CalibrationError> {
    let scale = parse_reply(&channel.query(scale_command, NUMERIC_REPLY_LEN)?, scale_name)?;
    let offset = parse_reply(&channel.query(offset_command, NUMERIC_REPLY_LEN)?, offset_name)?;

    // subnormal scales overflow offset/scale in the decoder
    if !scale.is_normal() {
        return Err(CalibrationError::Invalid {
            quantity: scale_name,
        });
    }

    log::debug!("{}: {}, {}: {}", scale_name, scale, offset_name, offset);
    Ok(ChannelCalibration { scale, offset })
}

/// Parse an ASCII float reply such as `2.00E+0\n`
pub fn parse_reply(reply: &[u8], quantity: &'static str) -> Result<f64, CalibrationError> {
    let parse_error = || CalibrationError::Parse {
        quantity,
        reply: String::from_utf8_lossy(reply).into_owned(),
    };

    let text = std::str::from_utf8(reply).map_err(|_| parse_error())?;
    let value: f64 = text
        .trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
        .parse()
        .map_err(|_| parse_error())?;

    if !value.is_finite() {
        return Err(parse_error());
    }
    Ok(value)
}

/// Time coordinate of every point in the display window.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis(Vec<f64>);

impl TimeAxis {
    /// Points from `-6 * time_scale` in steps of `time_scale / 50`
    pub fn new(time_scale: f64) -> Self {
        let step = time_scale / POINTS_PER_DIVISION;
        let start = -(WINDOW_LEN as f64 / 2.0) * step;
        Self((0..WINDOW_LEN).map(|i| start + i as f64 * step).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First and last coordinate
    pub fn span(&self) -> (f64, f64) {
        (
            self.0.first().copied().unwrap_or_default(),
            self.0.last().copied().unwrap_or_default(),
        )
    }
}

/// The calibration currently in effect and the time axis derived from it.
///
/// Both are only ever replaced together, after a complete and valid query.
#[derive(Debug, Clone)]
pub struct CalibrationState {
    params: CalibrationParams,
    time_axis: TimeAxis,
}

impl CalibrationState {
    /// Query the scope for an initial calibration
    pub fn load<T: Transport>(channel: &mut InstrumentChannel<T>) -> Result<Self, CalibrationError> {
        Ok(Self::from_params(CalibrationParams::query(channel)?))
    }

    pub fn from_params(params: CalibrationParams) -> Self {
        Self {
            time_axis: TimeAxis::new(params.time.scale),
            params,
        }
    }

    /// Re-query the scope. On error the previous calibration stays in effect.
    pub fn refresh<T: Transport>(
        &mut self,
        channel: &mut InstrumentChannel<T>,
    ) -> Result<CalibrationParams, CalibrationError> {
        *self = Self::load(channel)?;
        Ok(self.params)
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }
}
