use polars::prelude::{DataFrame, NamedFrom, PolarsError, Series};

use crate::calibration::{CalibrationError, CalibrationParams, CalibrationState, TimeAxis};
use crate::command::{Channel, Command};
use crate::instrument::{InstrumentChannel, PendingReply, RawReply};
use crate::transport::{DeviceFile, Transport, TransportError};
use crate::waveform::{DecodeError, FrameStats, VoltageSeries, WaveformDecoder, WAVEFORM_REPLY_LEN};

const TIME_COLUMN_NAME: &str = "time";
const CHAN1_COLUMN_NAME: &str = "chan1";
const CHAN2_COLUMN_NAME: &str = "chan2";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Decoded samples of one channel together with their summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTrace {
    pub series: VoltageSeries,
    pub stats: FrameStats,
}

/// Both channels of one acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub channel1: ChannelTrace,
    pub channel2: ChannelTrace,
}

impl Frame {
    pub fn channel(&self, channel: Channel) -> &ChannelTrace {
        match channel {
            Channel::One => &self.channel1,
            Channel::Two => &self.channel2,
        }
    }

    /// Put the frame next to its time axis in a `DataFrame`
    pub fn to_dataframe(&self, time_axis: &TimeAxis) -> Result<DataFrame, PolarsError> {
        DataFrame::new(vec![
            Series::new(TIME_COLUMN_NAME.into(), time_axis.as_slice()).into(),
            Series::new(CHAN1_COLUMN_NAME.into(), self.channel1.series.as_slice()).into(),
            Series::new(CHAN2_COLUMN_NAME.into(), self.channel2.series.as_slice()).into(),
        ])
    }
}

/// An open connection to one scope with its calibration loaded.
///
/// Frames are pulled by the caller with [`AcquisitionSession::acquire_frame`].
/// The calibration is only re-read when the caller asks for it, e.g. after a
/// knob on the scope has been turned.
#[derive(Debug)]
pub struct AcquisitionSession<T: Transport = DeviceFile> {
    channel: InstrumentChannel<T>,
    identity: String,
    calibration: CalibrationState,
}

impl AcquisitionSession<DeviceFile> {
    /// Open the device file at `path`, identify the scope and read its calibration
    pub fn start(path: &str) -> Result<Self, SessionError> {
        Self::with_transport(DeviceFile::open(path)?)
    }
}

impl<T: Transport> AcquisitionSession<T> {
    /// Identify the scope and read its calibration over an already open transport
    pub fn with_transport(transport: T) -> Result<Self, SessionError> {
        let mut channel = InstrumentChannel::new(transport);

        let identity = channel.identify()?;
        log::debug!("Connected to {}", identity);

        let calibration = CalibrationState::load(&mut channel)?;

        Ok(Self {
            channel,
            identity,
            calibration,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn calibration(&self) -> &CalibrationParams {
        self.calibration.params()
    }

    pub fn time_axis(&self) -> &TimeAxis {
        self.calibration.time_axis()
    }

    /// Re-read all scales and offsets from the scope
    pub fn refresh_calibration(&mut self) -> Result<CalibrationParams, SessionError> {
        Ok(self.calibration.refresh(&mut self.channel)?)
    }

    /// Read and decode both channels, channel 1 first
    pub fn acquire_frame(&mut self) -> Result<Frame, SessionError> {
        #[cfg(feature = "cpu-profiling")]
        let _span = tracy_client::span!("acquire frame");

        Ok(Frame {
            channel1: self.acquire_channel(Channel::One)?,
            channel2: self.acquire_channel(Channel::Two)?,
        })
    }

    /// Send `*RST` to the scope. The calibration is not refreshed.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        Ok(self.channel.reset()?)
    }

    /// Write a directive the scope does not answer
    pub fn execute(&mut self, command: Command) -> Result<(), SessionError> {
        Ok(self.channel.execute(command)?)
    }

    /// Write a query; its reply must be read before the session is used again
    pub fn send(&mut self, command: Command) -> Result<PendingReply<'_, T>, SessionError> {
        Ok(self.channel.send(command)?)
    }

    /// Write an arbitrary query and read at most `max_len` bytes of reply
    pub fn query(&mut self, command: Command, max_len: usize) -> Result<RawReply, SessionError> {
        Ok(self.channel.query(command, max_len)?)
    }

    pub fn into_transport(self) -> T {
        self.channel.into_inner()
    }

    fn acquire_channel(&mut self, channel: Channel) -> Result<ChannelTrace, SessionError> {
        let raw = self
            .channel
            .query(Command::waveform_data(channel), WAVEFORM_REPLY_LEN)?;
        log::debug!("{}: received {} bytes", channel, raw.len());

        let series = WaveformDecoder::decode(&raw, self.calibration.params(), channel)?;
        let stats = series.stats();
        Ok(ChannelTrace { series, stats })
    }
}
