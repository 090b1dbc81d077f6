//! Conversion of raw screen bytes into calibrated voltages.
//!
//! The scope sends one unsigned byte per sample with the amplitude inverted:
//! larger codes are lower voltages. After inversion, code 130 decodes to
//! `-offset`, so with a zero offset raw code 125 is 0 V. 25 codes make up one
//! vertical division.

use std::ops::Deref;

use crate::calibration::{CalibrationParams, ChannelCalibration, WINDOW_LEN};
use crate::command::Channel;

/// Bytes requested for one `:WAV:DATA?` reply
pub const WAVEFORM_REPLY_LEN: usize = 9000;

const CODES_PER_DIVISION: f64 = 25.0;
const CENTER_CODE: f64 = 130.0;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Waveform reply has {available} samples, need at least {required}")]
    InsufficientSamples { available: usize, required: usize },
}

/// Exactly [`WINDOW_LEN`] voltages of one channel, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageSeries(Vec<f64>);

impl VoltageSeries {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats::from_samples(&self.0)
    }
}

impl Deref for VoltageSeries {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Average and RMS of one series.
///
/// The RMS is taken around the mean, so a DC signal has an RMS of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub mean: f64,
    pub rms: f64,
}

impl FrameStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self { mean: 0.0, rms: 0.0 };
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            rms: variance.sqrt(),
        }
    }
}

pub struct WaveformDecoder;

impl WaveformDecoder {
    /// Decode the trailing window of `raw` using the calibration of `channel`
    pub fn decode(
        raw: &[u8],
        params: &CalibrationParams,
        channel: Channel,
    ) -> Result<VoltageSeries, DecodeError> {
        Self::decode_with(raw, params.channel(channel))
    }

    /// Decode the last [`WINDOW_LEN`] bytes of `raw`.
    ///
    /// Leading bytes are dropped; the scope sometimes prefixes the reply with
    /// bytes that are not samples.
    pub fn decode_with(
        raw: &[u8],
        calibration: &ChannelCalibration,
    ) -> Result<VoltageSeries, DecodeError> {
        #[cfg(feature = "cpu-profiling")]
        let _span = tracy_client::span!("decode waveform");

        let window = take_last(raw, WINDOW_LEN)?;
        Ok(VoltageSeries(
            window
                .iter()
                .map(|&code| Self::code_to_volts(code, calibration))
                .collect(),
        ))
    }

    /// Convert one raw sample code to volts
    pub fn code_to_volts(code: u8, calibration: &ChannelCalibration) -> f64 {
        let inverted = f64::from(255 - code);
        let offset_codes = calibration.offset / calibration.scale * CODES_PER_DIVISION;
        (inverted - CENTER_CODE - offset_codes) / CODES_PER_DIVISION * calibration.scale
    }
}

fn take_last(raw: &[u8], len: usize) -> Result<&[u8], DecodeError> {
    raw.len()
        .checked_sub(len)
        .map(|start| &raw[start..])
        .ok_or(DecodeError::InsufficientSamples {
            available: raw.len(),
            required: len,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: ChannelCalibration = ChannelCalibration {
        scale: 1.0,
        offset: 0.0,
    };

    fn params(channel1: ChannelCalibration, channel2: ChannelCalibration) -> CalibrationParams {
        CalibrationParams {
            channel1,
            channel2,
            time: ChannelCalibration {
                scale: 1e-3,
                offset: 0.0,
            },
        }
    }

    #[test]
    fn test_center_code_is_zero_volts() {
        for scale in [0.002, 0.1, 1.0, 5.0, -2.0] {
            let cal = ChannelCalibration { scale, offset: 0.0 };
            assert_eq!(WaveformDecoder::code_to_volts(125, &cal), 0.0);
        }
    }

    #[test]
    fn test_flat_reply_at_center() {
        let series = WaveformDecoder::decode_with(&[125u8; WINDOW_LEN], &UNIT).unwrap();
        assert_eq!(series.as_slice(), &[0.0; WINDOW_LEN][..]);

        let stats = series.stats();
        assert_eq!(stats, FrameStats { mean: 0.0, rms: 0.0 });
    }

    #[test]
    fn test_flat_reply_at_full_swing() {
        let series = WaveformDecoder::decode_with(&[0u8; WINDOW_LEN], &UNIT).unwrap();
        assert!(series.iter().all(|&v| v == 5.0));

        let stats = series.stats();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.rms, 0.0);
    }

    #[test]
    fn test_offset_and_scale() {
        let cal = ChannelCalibration { scale: 2.0, offset: 1.0 };
        // offset shifts by offset/scale*25 = 12.5 codes
        let volts = WaveformDecoder::code_to_volts(125, &cal);
        assert!((volts - -1.0).abs() < 1e-12);

        let volts = WaveformDecoder::code_to_volts(100, &cal);
        assert!((volts - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_decreasing_in_code() {
        for cal in [UNIT, ChannelCalibration { scale: 0.05, offset: -0.3 }] {
            let volts: Vec<f64> = (0..=255u8)
                .map(|code| WaveformDecoder::code_to_volts(code, &cal))
                .collect();
            assert!(volts.windows(2).all(|w| w[1] < w[0]));
        }
    }

    #[test]
    fn test_keeps_trailing_window() {
        let mut raw = vec![0xAAu8; 37];
        raw.extend((0..WINDOW_LEN).map(|i| (i % 256) as u8));

        let series = WaveformDecoder::decode_with(&raw, &UNIT).unwrap();
        let expected = WaveformDecoder::decode_with(&raw[37..], &UNIT).unwrap();
        assert_eq!(series.len(), WINDOW_LEN);
        assert_eq!(series, expected);
        assert_eq!(series[0], WaveformDecoder::code_to_volts(0, &UNIT));
    }

    #[test]
    fn test_leading_bytes_do_not_matter() {
        let tail: Vec<u8> = (0..WINDOW_LEN).map(|i| (i * 7 % 256) as u8).collect();
        let mut a = vec![0u8; 1000];
        a.extend(&tail);
        let mut b = vec![255u8; 8400];
        b.extend(&tail);

        assert_eq!(
            WaveformDecoder::decode_with(&a, &UNIT).unwrap(),
            WaveformDecoder::decode_with(&b, &UNIT).unwrap()
        );
    }

    #[test]
    fn test_short_reply() {
        let result = WaveformDecoder::decode_with(&[0u8; WINDOW_LEN - 1], &UNIT);
        assert!(matches!(
            result,
            Err(DecodeError::InsufficientSamples {
                available: 599,
                required: WINDOW_LEN
            })
        ));
        assert!(WaveformDecoder::decode_with(&[], &UNIT).is_err());
    }

    #[test]
    fn test_decode_uses_selected_channel() {
        let p = params(UNIT, ChannelCalibration { scale: 0.5, offset: 0.0 });
        let raw = [0u8; WINDOW_LEN];

        let one = WaveformDecoder::decode(&raw, &p, Channel::One).unwrap();
        let two = WaveformDecoder::decode(&raw, &p, Channel::Two).unwrap();
        assert_eq!(one[0], 5.0);
        assert_eq!(two[0], 2.5);
    }

    #[test]
    fn test_rms_of_square_wave() {
        let samples: Vec<f64> = (0..WINDOW_LEN)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let stats = FrameStats::from_samples(&samples);
        assert_eq!(stats.mean, 0.0);
        assert!((stats.rms - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rms_is_non_negative() {
        let raw: Vec<u8> = (0..WINDOW_LEN).map(|i| (i * 13 % 256) as u8).collect();
        let stats = WaveformDecoder::decode_with(&raw, &UNIT).unwrap().stats();
        assert!(stats.rms > 0.0);
    }
}
