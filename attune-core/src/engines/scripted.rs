//! Scripted engines — deterministic stand-ins for the native libraries.
//!
//! Used by the test suite and by the CLI's stub mode, so the whole
//! pipeline can be exercised end-to-end without vendor models or an
//! access key. `ScriptedWakeWord` detects on a fixed schedule of frame
//! indices; `ScriptedIntent` finalizes after a fixed number of command
//! frames and replays a scripted sequence of inferences.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::engines::{EngineProvider, IntentEngine, WakeWordEngine};
use crate::error::{AttuneError, Result};
use crate::events::Inference;

/// Audio format the scripted engines claim, chosen to match the real
/// engines so host framing code behaves identically in stub mode.
pub const SCRIPTED_SAMPLE_RATE: u32 = 16_000;
pub const SCRIPTED_FRAME_LENGTH: u32 = 512;

enum Schedule {
    /// Detect on exactly these frame indices (0-based, since creation).
    At(VecDeque<u64>),
    /// Detect on every `period`-th frame.
    Every(u64),
}

/// Wake-word engine that triggers on a scripted frame schedule.
pub struct ScriptedWakeWord {
    schedule: Schedule,
    frames_seen: u64,
    sample_rate: u32,
    frame_length: u32,
}

impl ScriptedWakeWord {
    /// Detect on the given frame indices, counted across this engine's
    /// own `process` calls.
    pub fn detect_at(indices: impl IntoIterator<Item = u64>) -> Self {
        Self {
            schedule: Schedule::At(indices.into_iter().collect()),
            frames_seen: 0,
            sample_rate: SCRIPTED_SAMPLE_RATE,
            frame_length: SCRIPTED_FRAME_LENGTH,
        }
    }

    /// Detect on every `period`-th frame (the last frame of each period).
    pub fn every(period: u64) -> Self {
        Self {
            schedule: Schedule::Every(period.max(1)),
            frames_seen: 0,
            sample_rate: SCRIPTED_SAMPLE_RATE,
            frame_length: SCRIPTED_FRAME_LENGTH,
        }
    }

    pub fn with_format(mut self, sample_rate: u32, frame_length: u32) -> Self {
        self.sample_rate = sample_rate;
        self.frame_length = frame_length;
        self
    }
}

impl WakeWordEngine for ScriptedWakeWord {
    fn process(&mut self, _frame: &[i16]) -> Result<bool> {
        let index = self.frames_seen;
        self.frames_seen += 1;

        let detected = match &mut self.schedule {
            Schedule::At(indices) => {
                if indices.front() == Some(&index) {
                    indices.pop_front();
                    true
                } else {
                    false
                }
            }
            Schedule::Every(period) => index % *period == *period - 1,
        };

        if detected {
            debug!(frame = index, "scripted wake word fired");
        }
        Ok(detected)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_length(&self) -> u32 {
        self.frame_length
    }

    fn version(&self) -> String {
        "scripted".into()
    }
}

/// Intent engine that finalizes after a fixed number of command frames,
/// replaying a scripted inference sequence (wrapping around when
/// exhausted).
pub struct ScriptedIntent {
    frames_per_command: u64,
    script: Vec<Inference>,
    cursor: usize,
    frames_seen: u64,
    finalized: bool,
    context_info: String,
    sample_rate: u32,
    frame_length: u32,
}

impl ScriptedIntent {
    pub fn new(frames_per_command: u64, script: Vec<Inference>) -> Self {
        Self {
            frames_per_command: frames_per_command.max(1),
            script,
            cursor: 0,
            frames_seen: 0,
            finalized: false,
            context_info: "scripted grammar".into(),
            sample_rate: SCRIPTED_SAMPLE_RATE,
            frame_length: SCRIPTED_FRAME_LENGTH,
        }
    }

    pub fn with_format(mut self, sample_rate: u32, frame_length: u32) -> Self {
        self.sample_rate = sample_rate;
        self.frame_length = frame_length;
        self
    }

    pub fn with_context_info(mut self, context_info: impl Into<String>) -> Self {
        self.context_info = context_info.into();
        self
    }
}

impl IntentEngine for ScriptedIntent {
    fn process(&mut self, _frame: &[i16]) -> Result<bool> {
        self.frames_seen += 1;
        if self.frames_seen >= self.frames_per_command {
            self.finalized = true;
        }
        Ok(self.finalized)
    }

    fn inference(&mut self) -> Result<Inference> {
        if !self.finalized {
            return Err(AttuneError::Runtime(
                "no finalized command to fetch an inference for".into(),
            ));
        }
        let inference = match self.script.get(self.cursor % self.script.len().max(1)) {
            Some(inference) => inference.clone(),
            None => Inference::not_understood(),
        };
        self.cursor += 1;
        Ok(inference)
    }

    fn reset(&mut self) -> Result<()> {
        debug!(frames_accumulated = self.frames_seen, "scripted intent reset");
        self.frames_seen = 0;
        self.finalized = false;
        Ok(())
    }

    fn context_info(&self) -> String {
        self.context_info.clone()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_length(&self) -> u32 {
        self.frame_length
    }

    fn version(&self) -> String {
        "scripted".into()
    }
}

/// Provider that hands out a pre-built pair of scripted engines.
///
/// Each engine can be taken once; asking twice is a programming error in
/// the host and surfaces as `Runtime`.
pub struct ScriptedProvider {
    wake: Option<Box<dyn WakeWordEngine>>,
    intent: Option<Box<dyn IntentEngine>>,
}

impl ScriptedProvider {
    pub fn new(
        wake: impl WakeWordEngine + 'static,
        intent: impl IntentEngine + 'static,
    ) -> Self {
        Self {
            wake: Some(Box::new(wake)),
            intent: Some(Box::new(intent)),
        }
    }
}

impl EngineProvider for ScriptedProvider {
    fn wake_word(&mut self, _config: &PipelineConfig) -> Result<Box<dyn WakeWordEngine>> {
        self.wake
            .take()
            .ok_or_else(|| AttuneError::Runtime("scripted wake-word engine already taken".into()))
    }

    fn intent(&mut self, _config: &PipelineConfig) -> Result<Box<dyn IntentEngine>> {
        self.intent
            .take()
            .ok_or_else(|| AttuneError::Runtime("scripted intent engine already taken".into()))
    }
}
