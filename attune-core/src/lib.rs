//! # attune-core
//!
//! Always-listening voice command SDK: a wake-word gate in front of a
//! speech-to-intent engine, sequenced by a single synchronous controller.
//!
//! ## Architecture
//!
//! ```text
//! host audio loop ──frame──► VoicePipeline::process
//!                                 │
//!                 AwaitingWakeWord│AwaitingCommand
//!                                 │
//!                 WakeWordEngine ─┴─ IntentEngine
//!                       │                 │
//!                 on_wake_word()    on_inference(Inference)
//! ```
//!
//! The pipeline owns no threads and performs no audio I/O of its own;
//! the host feeds it fixed-size 16-bit PCM frames and receives events
//! synchronously. The `audio` module carries the capture/framing
//! plumbing the bundled demos use to produce those frames.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod config;
pub mod engines;
pub mod error;
pub mod events;
pub mod pipeline;

// Convenience re-exports for downstream crates
pub use config::PipelineConfig;
pub use engines::{EngineProvider, IntentEngine, WakeWordEngine};
pub use error::{AttuneError, Result};
pub use events::{EventSender, Inference, VoiceEvent, VoiceEventHandler};
pub use pipeline::{ListeningState, VoicePipeline};

#[cfg(feature = "picovoice")]
pub use engines::picovoice::PicovoiceProvider;
