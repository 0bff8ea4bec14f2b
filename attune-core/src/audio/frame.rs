//! Fixed-size frame assembly for the engines.
//!
//! Capture hands over arbitrarily sized f32 chunks at the device rate;
//! the engines want exact `frame_length` slices of 16-bit PCM at their
//! own rate. `FrameAssembler` chains the rate converter with i16
//! quantisation and frame slicing.

use crate::audio::resample::RateConverter;
use crate::error::Result;

/// Input samples handed to the resampler per block. 20 ms at 48 kHz.
const RESAMPLE_BLOCK: usize = 960;

/// Turns captured f32 audio into engine-ready i16 frames.
pub struct FrameAssembler {
    converter: RateConverter,
    pending: Vec<i16>,
    frame_length: usize,
}

impl FrameAssembler {
    /// # Errors
    /// `AttuneError::AudioDevice` if the resampler cannot be configured.
    pub fn new(capture_rate: u32, engine_rate: u32, frame_length: u32) -> Result<Self> {
        Ok(Self {
            converter: RateConverter::new(capture_rate, engine_rate, RESAMPLE_BLOCK)?,
            pending: Vec::new(),
            frame_length: frame_length as usize,
        })
    }

    /// Feed captured samples in [-1.0, 1.0].
    pub fn push(&mut self, samples: &[f32]) {
        let converted = self.converter.convert(samples);
        self.pending.extend(
            converted
                .iter()
                .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
        );
    }

    /// Pop the next complete frame, if one is ready.
    pub fn next_frame(&mut self) -> Option<Vec<i16>> {
        if self.pending.len() < self.frame_length {
            return None;
        }
        Some(self.pending.drain(..self.frame_length).collect())
    }

    /// Samples buffered but not yet forming a complete frame.
    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }
}
