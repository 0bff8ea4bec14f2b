//! Pipeline configuration and fail-fast validation.
//!
//! Every constraint is checked before either engine is instantiated, and
//! each violation gets its own `InvalidArgument` message so a host can
//! tell a bad path from a bad sensitivity without string matching on
//! vendor errors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AttuneError, Result};

/// Default sensitivity for both engines. Higher values reduce misses at
/// the cost of more false alarms.
pub const DEFAULT_SENSITIVITY: f32 = 0.5;

/// Default endpoint duration: how much trailing silence marks the end of
/// a spoken command.
pub const DEFAULT_ENDPOINT_DURATION_SEC: f32 = 1.0;

/// Accepted endpoint duration range in seconds.
pub const ENDPOINT_DURATION_RANGE_SEC: (f32, f32) = (0.5, 5.0);

/// Configuration for [`crate::VoicePipeline`].
///
/// Serde-derived so hosts can load it from a JSON settings file; missing
/// fields fall back to the same defaults `new` applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// License credential for the underlying engines. Must be non-empty.
    pub access_key: String,

    /// Wake-word model for the trigger phrase.
    pub keyword_path: PathBuf,
    /// Wake-word engine sensitivity in [0, 1].
    pub wake_sensitivity: f32,
    /// Override for the wake-word engine's base model file.
    pub wake_model_path: Option<PathBuf>,
    /// Override for the wake-word engine's dynamic library.
    pub wake_library_path: Option<PathBuf>,

    /// Context (grammar) model for the intent engine.
    pub context_path: PathBuf,
    /// Intent engine sensitivity in [0, 1].
    pub intent_sensitivity: f32,
    /// Override for the intent engine's base model file.
    pub intent_model_path: Option<PathBuf>,
    /// Override for the intent engine's dynamic library.
    pub intent_library_path: Option<PathBuf>,

    /// Trailing-silence duration (seconds) that finalizes a command.
    pub endpoint_duration_sec: f32,
    /// When `false`, the intent engine may finalize as soon as the
    /// command is unambiguous, without waiting for the endpoint.
    pub require_endpoint: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            keyword_path: PathBuf::new(),
            wake_sensitivity: DEFAULT_SENSITIVITY,
            wake_model_path: None,
            wake_library_path: None,
            context_path: PathBuf::new(),
            intent_sensitivity: DEFAULT_SENSITIVITY,
            intent_model_path: None,
            intent_library_path: None,
            endpoint_duration_sec: DEFAULT_ENDPOINT_DURATION_SEC,
            require_endpoint: true,
        }
    }
}

impl PipelineConfig {
    /// A configuration with the three required fields set and everything
    /// else at its default.
    pub fn new(
        access_key: impl Into<String>,
        keyword_path: impl Into<PathBuf>,
        context_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            keyword_path: keyword_path.into(),
            context_path: context_path.into(),
            ..Self::default()
        }
    }

    /// Check every constraint, returning the first violation.
    ///
    /// NaN sensitivities and durations are rejected by the range checks.
    pub fn validate(&self) -> Result<()> {
        if self.access_key.trim().is_empty() {
            return Err(AttuneError::InvalidArgument(
                "access key must not be empty".into(),
            ));
        }

        if !self.keyword_path.is_file() {
            return Err(AttuneError::InvalidArgument(format!(
                "keyword file not found: {}",
                self.keyword_path.display()
            )));
        }

        if !self.context_path.is_file() {
            return Err(AttuneError::InvalidArgument(format!(
                "context file not found: {}",
                self.context_path.display()
            )));
        }

        for (label, path) in [
            ("wake-word model", &self.wake_model_path),
            ("wake-word library", &self.wake_library_path),
            ("intent model", &self.intent_model_path),
            ("intent library", &self.intent_library_path),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(AttuneError::InvalidArgument(format!(
                        "{label} not found: {}",
                        path.display()
                    )));
                }
            }
        }

        if !(0.0..=1.0).contains(&self.wake_sensitivity) {
            return Err(AttuneError::InvalidArgument(format!(
                "wake-word sensitivity must be within [0, 1], got {}",
                self.wake_sensitivity
            )));
        }

        if !(0.0..=1.0).contains(&self.intent_sensitivity) {
            return Err(AttuneError::InvalidArgument(format!(
                "intent sensitivity must be within [0, 1], got {}",
                self.intent_sensitivity
            )));
        }

        let (min_endpoint, max_endpoint) = ENDPOINT_DURATION_RANGE_SEC;
        if !(min_endpoint..=max_endpoint).contains(&self.endpoint_duration_sec) {
            return Err(AttuneError::InvalidArgument(format!(
                "endpoint duration must be within [{min_endpoint}, {max_endpoint}] seconds, got {}",
                self.endpoint_duration_sec
            )));
        }

        Ok(())
    }
}
