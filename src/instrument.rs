use std::io;
use std::ops::Deref;

use crate::command::Command;
use crate::transport::{Transport, TransportError};

/// Longest identity string the scope sends back for `*IDN?`
pub const IDENTITY_REPLY_LEN: usize = 300;

/// Bytes returned by a single read, at most the requested length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply(Vec<u8>);

impl RawReply {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for RawReply {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for RawReply {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Command/response link to the instrument.
///
/// Every read must follow its own query write. A channel with no reply
/// outstanding is idle; [`InstrumentChannel::send`] moves it to the awaiting
/// state by handing out a [`PendingReply`] that borrows the channel until the
/// reply is read. A second read, or a new write before the reply has been
/// consumed, is rejected by the borrow checker.
#[derive(Debug)]
pub struct InstrumentChannel<T: Transport> {
    transport: T,
}

/// A query that has been written and whose reply has not been read yet.
#[must_use = "the instrument is waiting for this reply to be read"]
#[derive(Debug)]
pub struct PendingReply<'a, T: Transport> {
    channel: &'a mut InstrumentChannel<T>,
    command: Command,
}

impl<T: Transport> InstrumentChannel<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Write `command` and return the handle for its reply
    pub fn send(&mut self, command: Command) -> Result<PendingReply<'_, T>, TransportError> {
        self.write_command(command)?;
        Ok(PendingReply {
            channel: self,
            command,
        })
    }

    /// Write `command`, then read at most `max_len` bytes of reply
    pub fn query(&mut self, command: Command, max_len: usize) -> Result<RawReply, TransportError> {
        self.send(command)?.read(max_len)
    }

    /// Ask the scope who it is. The identity is not validated.
    pub fn identify(&mut self) -> Result<String, TransportError> {
        let reply = self.query(Command::IDENTIFY, IDENTITY_REPLY_LEN)?;
        Ok(String::from_utf8_lossy(&reply).trim().to_string())
    }

    /// Write a directive the scope does not answer, such as `:RUN`
    pub fn execute(&mut self, command: Command) -> Result<(), TransportError> {
        self.write_command(command)
    }

    /// Send `*RST`. The scope does not answer.
    pub fn reset(&mut self) -> Result<(), TransportError> {
        log::debug!("Resetting instrument");
        self.execute(Command::RESET)
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn write_command(&mut self, command: Command) -> Result<(), TransportError> {
        let bytes = command.as_bytes();
        let written = self.transport.write(bytes)?;
        if written != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {written} of {} bytes of '{command}'", bytes.len()),
            )
            .into());
        }
        Ok(())
    }
}

impl<T: Transport> PendingReply<'_, T> {
    pub fn command(&self) -> Command {
        self.command
    }

    /// Read the reply, returning the channel to idle
    pub fn read(self, max_len: usize) -> Result<RawReply, TransportError> {
        let bytes = self.channel.transport.read(max_len)?;
        Ok(RawReply(bytes))
    }
}
