use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Device {path} is unavailable: {source}")]
    DeviceUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A raw, unframed byte stream to an instrument.
///
/// Implementations perform exactly one underlying write or read per call.
/// There are no retries: a short read is handed back to the caller as-is.
pub trait Transport {
    /// Write `bytes` to the device, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Read at most `max_len` bytes, blocking until the device has data.
    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(max_len)
    }
}

/// A character device such as `/dev/usbtmc0`, opened for reading and writing.
///
/// The handle is closed when the value is dropped.
#[derive(Debug)]
pub struct DeviceFile {
    file: File,
    path: String,
}

impl DeviceFile {
    /// Open `path` for simultaneous read/write
    pub fn open(path: &str) -> Result<Self, TransportError> {
        log::debug!("Opening device file {}", path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| TransportError::DeviceUnavailable {
                path: path.to_string(),
                source,
            })?;

        Ok(Self {
            file,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for DeviceFile {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        Ok(self.file.write(bytes)?)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        read_bounded(&mut self.file, max_len)
    }
}

/// The RS-232 port found on the back of DS1000 series scopes.
///
/// Unlike [`DeviceFile`], reads give up after `timeout` and report
/// [`io::ErrorKind::TimedOut`].
pub struct SerialLink {
    serial: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open the serial port at `path` with 8N1 framing
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        log::debug!("Opening serial port {} at {} baud", path, baud_rate);
        let serial = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| TransportError::DeviceUnavailable {
                path: path.to_string(),
                source: e.into(),
            })?;

        Ok(Self { serial })
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.serial.name())
            .finish()
    }
}

impl Transport for SerialLink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        Ok(self.serial.write(bytes)?)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        read_bounded(&mut self.serial, max_len)
    }
}

fn read_bounded<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, TransportError> {
    let mut buf = vec![0u8; max_len];
    let n = reader.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

/// In-memory transport that replays canned replies and records every write.
#[cfg(test)]
pub(crate) mod scripted {
    use super::{Transport, TransportError};
    use std::collections::VecDeque;
    use std::io;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Write(Vec<u8>),
        Read(usize),
    }

    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        replies: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
        failing_write: Option<(usize, io::ErrorKind)>,
        writes_seen: usize,
        pub events: Vec<Event>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, bytes: impl AsRef<[u8]>) -> Self {
            self.replies.push_back(Ok(bytes.as_ref().to_vec()));
            self
        }

        pub fn fail_read(mut self, kind: io::ErrorKind) -> Self {
            self.replies.push_back(Err(kind));
            self
        }

        /// Make the write with zero-based index `index` fail with `kind`.
        /// A failed write is not recorded as an event.
        pub fn fail_write(mut self, index: usize, kind: io::ErrorKind) -> Self {
            self.failing_write = Some((index, kind));
            self
        }

        pub fn reads(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, Event::Read(_)))
                .count()
        }

        pub fn writes(&self) -> Vec<String> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Write(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    Event::Read(_) => None,
                })
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
            let index = self.writes_seen;
            self.writes_seen += 1;
            if let Some((failing, kind)) = self.failing_write {
                if failing == index {
                    return Err(io::Error::from(kind).into());
                }
            }
            self.events.push(Event::Write(bytes.to_vec()));
            Ok(bytes.len())
        }

        fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
            self.events.push(Event::Read(max_len));
            match self.replies.pop_front() {
                Some(Ok(mut bytes)) => {
                    bytes.truncate(max_len);
                    Ok(bytes)
                }
                Some(Err(kind)) => Err(io::Error::from(kind).into()),
                None => Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
            }
        }
    }
}
