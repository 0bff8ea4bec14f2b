//! Capture-rate → engine-rate conversion using a rubato `FastFixedIn`
//! resampler.
//!
//! Input devices commonly capture at 44.1 or 48 kHz while the engines
//! are trained at 16 kHz. `RateConverter` bridges that gap off the RT
//! thread; when the rates already match it degenerates to a passthrough
//! with no rubato session at all.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::{info, warn};

use crate::error::{AttuneError, Result};

/// Converts mono f32 audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` in passthrough mode (capture rate == engine rate).
    resampler: Option<FastFixedIn<f32>>,
    /// Input samples carried over until a full rubato block is available.
    carry: Vec<f32>,
    /// Input samples rubato consumes per call.
    block: usize,
    /// Pre-allocated `[1][output_frames_max]` output buffer.
    out: Vec<Vec<f32>>,
}

impl RateConverter {
    /// # Parameters
    /// - `capture_rate`: rate of the incoming audio (Hz).
    /// - `engine_rate`: rate the engines expect (Hz).
    /// - `block`: input samples per rubato call.
    ///
    /// # Errors
    /// `AttuneError::AudioDevice` if rubato rejects the configuration.
    pub fn new(capture_rate: u32, engine_rate: u32, block: usize) -> Result<Self> {
        if capture_rate == engine_rate {
            return Ok(Self {
                resampler: None,
                carry: Vec::new(),
                block,
                out: Vec::new(),
            });
        }

        let ratio = f64::from(engine_rate) / f64::from(capture_rate);
        let resampler = FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, block, 1)
            .map_err(|e| AttuneError::AudioDevice(format!("resampler init: {e}")))?;

        let max_out = resampler.output_frames_max();
        info!(capture_rate, engine_rate, block, "resampling enabled");

        Ok(Self {
            resampler: Some(resampler),
            carry: Vec::new(),
            block,
            out: vec![vec![0f32; max_out]; 1],
        })
    }

    /// Feed captured samples, returning whatever resampled audio is ready.
    ///
    /// Input is accumulated until a full block is available; the
    /// remainder stays buffered for the next call. Passthrough mode
    /// returns the input unchanged.
    pub fn convert(&mut self, samples: &[f32]) -> Vec<f32> {
        let Some(ref mut resampler) = self.resampler else {
            return samples.to_vec();
        };

        self.carry.extend_from_slice(samples);

        let mut converted = Vec::new();
        while self.carry.len() >= self.block {
            match resampler.process_into_buffer(&[&self.carry[..self.block]], &mut self.out, None)
            {
                Ok((_consumed, produced)) => {
                    converted.extend_from_slice(&self.out[0][..produced]);
                }
                Err(e) => warn!("resampler block dropped: {e}"),
            }
            self.carry.drain(..self.block);
        }

        converted
    }

    /// `true` when no rate conversion happens.
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}
