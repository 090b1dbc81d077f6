//! # RigolScope RS
//!
//! A Rust library for pulling live waveforms out of a Rigol DS1000 series
//! oscilloscope through its USBTMC character device (or its serial port).
//!
//! The crate covers the command/response protocol, the parsing of the
//! scope's scale and offset replies, and the conversion of raw screen bytes
//! into calibrated voltages. Drawing the result is left to the caller.
//!
//! ## Features
//!
//! - **Raw transports**: `/dev/usbtmc*` device files, or RS-232 via `serialport`
//! - **Ordered protocol**: a reply can only be read right after its own query
//! - **Atomic calibration**: scales and offsets are swapped in all at once or not at all
//! - **Calibrated frames**: 600 samples per channel with mean and RMS
//! - **DataFrame output**: frames export to `polars` for analysis or CSV
//!
//! ## Examples
//!
//! ### Polling frames
//!
//! ```rust,no_run
//! use rigolscope_rs::AcquisitionSession;
//!
//! let mut session = AcquisitionSession::start("/dev/usbtmc0")?;
//! println!("Connected to {}", session.identity());
//!
//! for _ in 0..10 {
//!     let frame = session.acquire_frame()?;
//!     println!(
//!         "CH1 avg {:.3} V rms {:.3} V",
//!         frame.channel1.stats.mean, frame.channel1.stats.rms
//!     );
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### After turning a knob
//!
//! ```rust,no_run
//! use rigolscope_rs::AcquisitionSession;
//!
//! let mut session = AcquisitionSession::start("/dev/usbtmc0")?;
//! let params = session.refresh_calibration()?;
//! let (low, high) = params.channel1.display_range();
//! println!("CH1 spans {low:.2} V to {high:.2} V");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Decoding without a scope
//!
//! ```rust
//! use rigolscope_rs::{ChannelCalibration, WaveformDecoder, WINDOW_LEN};
//!
//! let calibration = ChannelCalibration { scale: 1.0, offset: 0.0 };
//! let series = WaveformDecoder::decode_with(&[0u8; WINDOW_LEN], &calibration).unwrap();
//! assert_eq!(series.stats().mean, 5.0);
//! ```

pub mod calibration;
pub mod command;
pub mod instrument;
pub mod session;
pub mod transport;
pub mod waveform;

// Re-export the main types for convenience
pub use calibration::{
    CalibrationError, CalibrationParams, CalibrationState, ChannelCalibration, TimeAxis,
    NUMERIC_REPLY_LEN, WINDOW_LEN,
};

pub use command::{Channel, Command};

pub use instrument::{InstrumentChannel, PendingReply, RawReply, IDENTITY_REPLY_LEN};

pub use session::{AcquisitionSession, ChannelTrace, Frame, SessionError};

pub use transport::{DeviceFile, SerialLink, Transport, TransportError};

pub use waveform::{DecodeError, FrameStats, VoltageSeries, WaveformDecoder, WAVEFORM_REPLY_LEN};
