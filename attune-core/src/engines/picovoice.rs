//! Adapters over the Picovoice engines: Porcupine (wake word) and Rhino
//! (speech-to-intent).
//!
//! Gated behind the `picovoice` feature because both crates load a
//! license-gated native library at runtime. Each adapter owns its engine
//! handle exclusively and maps the vendor's status codes into the crate
//! taxonomy at this boundary — nothing vendor-specific is re-exported.

use porcupine::{Porcupine, PorcupineBuilder, PorcupineError, PorcupineErrorStatus};
use rhino::{Rhino, RhinoBuilder, RhinoError, RhinoErrorStatus};
use tracing::info;

use crate::config::PipelineConfig;
use crate::engines::{EngineProvider, IntentEngine, WakeWordEngine};
use crate::error::{AttuneError, Result};
use crate::events::Inference;

/// Wake-word engine backed by Porcupine, configured with a single
/// keyword model.
pub struct PorcupineWakeWord {
    inner: Porcupine,
}

impl PorcupineWakeWord {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut builder = PorcupineBuilder::new_with_keyword_paths(
            config.access_key.as_str(),
            &[config.keyword_path.clone()],
        );
        builder.sensitivities(&[config.wake_sensitivity]);
        if let Some(path) = &config.wake_model_path {
            builder.model_path(path.clone());
        }
        if let Some(path) = &config.wake_library_path {
            builder.library_path(path.clone());
        }

        let inner = builder.init().map_err(map_porcupine_error)?;
        info!(version = %inner.version(), "wake-word engine loaded");
        Ok(Self { inner })
    }
}

impl WakeWordEngine for PorcupineWakeWord {
    fn process(&mut self, frame: &[i16]) -> Result<bool> {
        // Porcupine reports the index of the detected keyword; we load
        // exactly one, so any non-negative index is a detection.
        let keyword_index = self.inner.process(frame).map_err(map_porcupine_error)?;
        Ok(keyword_index >= 0)
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn frame_length(&self) -> u32 {
        self.inner.frame_length()
    }

    fn version(&self) -> String {
        self.inner.version().to_string()
    }
}

/// Intent engine backed by Rhino, configured with a single context
/// (grammar) model.
pub struct RhinoIntent {
    inner: Rhino,
}

impl RhinoIntent {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut builder = RhinoBuilder::new(
            config.access_key.as_str(),
            config.context_path.clone(),
        );
        builder.sensitivity(config.intent_sensitivity);
        builder.endpoint_duration_sec(config.endpoint_duration_sec);
        builder.require_endpoint(config.require_endpoint);
        if let Some(path) = &config.intent_model_path {
            builder.model_path(path.clone());
        }
        if let Some(path) = &config.intent_library_path {
            builder.library_path(path.clone());
        }

        let inner = builder.init().map_err(map_rhino_error)?;
        info!(version = %inner.version(), "intent engine loaded");
        Ok(Self { inner })
    }
}

impl IntentEngine for RhinoIntent {
    fn process(&mut self, frame: &[i16]) -> Result<bool> {
        self.inner.process(frame).map_err(map_rhino_error)
    }

    fn inference(&mut self) -> Result<Inference> {
        let inference = self.inner.get_inference().map_err(map_rhino_error)?;
        Ok(Inference {
            is_understood: inference.is_understood,
            intent: inference.intent,
            slots: inference.slots,
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset().map_err(map_rhino_error)
    }

    fn context_info(&self) -> String {
        self.inner.context_info().to_string()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn frame_length(&self) -> u32 {
        self.inner.frame_length()
    }

    fn version(&self) -> String {
        self.inner.version().to_string()
    }
}

/// Provider wiring both Picovoice engines into a pipeline.
pub struct PicovoiceProvider;

impl EngineProvider for PicovoiceProvider {
    fn wake_word(&mut self, config: &PipelineConfig) -> Result<Box<dyn WakeWordEngine>> {
        Ok(Box::new(PorcupineWakeWord::from_config(config)?))
    }

    fn intent(&mut self, config: &PipelineConfig) -> Result<Box<dyn IntentEngine>> {
        Ok(Box::new(RhinoIntent::from_config(config)?))
    }
}

fn map_porcupine_error(err: PorcupineError) -> AttuneError {
    let message = err.to_string();
    match err.status {
        PorcupineErrorStatus::LibraryError(status) => map_status(&format!("{status:?}"), message),
        PorcupineErrorStatus::ArgumentError | PorcupineErrorStatus::FrameLengthError => {
            AttuneError::InvalidArgument(message)
        }
        PorcupineErrorStatus::LibraryLoadError => AttuneError::Io(message),
    }
}

fn map_rhino_error(err: RhinoError) -> AttuneError {
    let message = err.to_string();
    match err.status {
        RhinoErrorStatus::LibraryError(status) => map_status(&format!("{status:?}"), message),
        RhinoErrorStatus::ArgumentError | RhinoErrorStatus::FrameLengthError => {
            AttuneError::InvalidArgument(message)
        }
        RhinoErrorStatus::LibraryLoadError => AttuneError::Io(message),
    }
}

/// Map a native status code to exactly one taxonomy variant.
///
/// Both vendor crates define their own copy of the status enum, so the
/// match is on the debug name, which is identical across the two.
fn map_status(status: &str, message: String) -> AttuneError {
    match status {
        "OUT_OF_MEMORY" => AttuneError::Memory(message),
        "IO_ERROR" => AttuneError::Io(message),
        "INVALID_ARGUMENT" | "KEY_ERROR" => AttuneError::InvalidArgument(message),
        "ACTIVATION_ERROR" => AttuneError::ActivationError(message),
        "ACTIVATION_LIMIT_REACHED" => AttuneError::ActivationLimitReached(message),
        "ACTIVATION_THROTTLED" => AttuneError::ActivationThrottled(message),
        "ACTIVATION_REFUSED" => AttuneError::ActivationRefused(message),
        _ => AttuneError::Runtime(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_map_one_to_one() {
        let cases = [
            ("OUT_OF_MEMORY", "out of memory"),
            ("IO_ERROR", "IO error"),
            ("INVALID_ARGUMENT", "invalid argument"),
            ("ACTIVATION_ERROR", "activation error"),
            ("ACTIVATION_LIMIT_REACHED", "activation limit reached"),
            ("ACTIVATION_THROTTLED", "activation throttled"),
            ("ACTIVATION_REFUSED", "activation refused"),
            ("RUNTIME_ERROR", "runtime error"),
            ("INVALID_STATE", "runtime error"),
        ];
        for (status, expected_prefix) in cases {
            let mapped = map_status(status, "detail".into());
            assert!(
                mapped.to_string().starts_with(expected_prefix),
                "{status} mapped to {mapped}"
            );
        }
    }
}
