//! Engine contracts.
//!
//! Both inference engines are pre-built, closed-box native libraries;
//! these traits are the whole of what the pipeline knows about them. The
//! `WakeWordEngine` consumes frames and flags the trigger phrase; the
//! `IntentEngine` accumulates frames after activation and eventually
//! finalizes with an [`Inference`].
//!
//! `&mut self` on `process` intentionally expresses that both engines are
//! stateful accumulators, and that a handle must never be shared between
//! pipelines or threads.

pub mod scripted;

#[cfg(feature = "picovoice")]
pub mod picovoice;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::events::Inference;

/// Contract for wake-word spotting backends.
pub trait WakeWordEngine: Send {
    /// Feed one frame of 16-bit mono PCM. Returns `true` on the frame in
    /// which the wake phrase completes.
    ///
    /// # Errors
    /// Engine-internal faults, already mapped into the crate taxonomy.
    fn process(&mut self, frame: &[i16]) -> Result<bool>;

    /// Sample rate this engine was trained against (Hz).
    fn sample_rate(&self) -> u32;

    /// Number of samples per frame this engine expects.
    fn frame_length(&self) -> u32;

    /// Engine version, for diagnostics.
    fn version(&self) -> String;
}

/// Contract for speech-to-intent backends.
pub trait IntentEngine: Send {
    /// Feed one frame of 16-bit mono PCM. The engine accumulates audio
    /// across calls; returns `true` once the command is finalized.
    ///
    /// # Errors
    /// Engine-internal faults, already mapped into the crate taxonomy.
    fn process(&mut self, frame: &[i16]) -> Result<bool>;

    /// Retrieve the inference for the finalized command. Valid once
    /// `process` has returned `true` and before the next `reset`.
    fn inference(&mut self) -> Result<Inference>;

    /// Clear the accumulated command buffer, so the next activation
    /// starts from a clean slate.
    fn reset(&mut self) -> Result<()>;

    /// Human-readable description of the loaded grammar (intents, slots
    /// and expressions), passed through to hosts verbatim.
    fn context_info(&self) -> String;

    /// Sample rate this engine was trained against (Hz).
    fn sample_rate(&self) -> u32;

    /// Number of samples per frame this engine expects.
    fn frame_length(&self) -> u32;

    /// Engine version, for diagnostics.
    fn version(&self) -> String;
}

/// Factory seam between configuration and engine instances.
///
/// `VoicePipeline::new` validates the configuration first and only then
/// asks the provider for engines, so a bad sensitivity or path never
/// touches the native libraries.
pub trait EngineProvider {
    /// Instantiate the wake-word engine.
    fn wake_word(&mut self, config: &PipelineConfig) -> Result<Box<dyn WakeWordEngine>>;

    /// Instantiate the intent engine.
    fn intent(&mut self, config: &PipelineConfig) -> Result<Box<dyn IntentEngine>>;
}
