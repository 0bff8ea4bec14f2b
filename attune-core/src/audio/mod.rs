//! Host-side audio plumbing: capture, rate conversion and frame
//! assembly.
//!
//! None of this is required to drive [`crate::VoicePipeline`] — hosts
//! that already produce 16-bit frames at the engine rate can call
//! `process` directly. It exists so the demos (and similar hosts) can go
//! from a cpal input stream to engine-ready frames:
//!
//! ```text
//! Microphone → AudioCapture → SPSC ring (f32, device rate)
//!                  → RateConverter → FrameAssembler → &[i16] frames
//! ```
//!
//! The capture callback is zero-alloc; conversion happens on the thread
//! that drains the ring.

#[cfg(feature = "audio-cpal")]
pub mod capture;
pub mod frame;
pub mod resample;

#[cfg(feature = "audio-cpal")]
pub use capture::AudioCapture;
pub use frame::FrameAssembler;
pub use resample::RateConverter;
