use thiserror::Error;

/// All errors produced by attune-core.
///
/// Engine failures are mapped 1:1 into this taxonomy at the pipeline
/// boundary — no vendor error type crosses the public API. The activation
/// variants are kept distinct so callers can react differently (prompt for
/// a new key vs. back off).
#[derive(Debug, Error)]
pub enum AttuneError {
    /// Bad configuration or a violated caller contract: missing file,
    /// sensitivity or endpoint duration out of range, empty access key,
    /// wrong frame length.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// License activation failed.
    #[error("activation error: {0}")]
    ActivationError(String),

    /// The access key has reached its activation limit.
    #[error("activation limit reached: {0}")]
    ActivationLimitReached(String),

    /// Activation was refused for this access key.
    #[error("activation refused: {0}")]
    ActivationRefused(String),

    /// Too many activation attempts in a short window.
    #[error("activation throttled: {0}")]
    ActivationThrottled(String),

    /// An engine failed to read a model or library file.
    #[error("IO error: {0}")]
    Io(String),

    /// An engine failed to allocate memory.
    #[error("out of memory: {0}")]
    Memory(String),

    /// Catch-all for engine-internal faults not otherwise classified.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Host-side capture: the audio device could not be opened or queried.
    #[error("audio device error: {0}")]
    AudioDevice(String),

    /// Host-side capture: the audio stream failed mid-flight.
    #[error("audio stream error: {0}")]
    AudioStream(String),

    /// Host-side capture: no usable input device on this machine.
    #[error("no default input device found")]
    NoDefaultInputDevice,
}

pub type Result<T> = std::result::Result<T, AttuneError>;
