//! Events raised by the pipeline and the value object delivered when a
//! command completes.
//!
//! Hosts choose one of two delivery styles:
//!
//! - implement [`VoiceEventHandler`] for inline callbacks, or
//! - hand the pipeline an [`EventSender`] and drain a channel of
//!   [`VoiceEvent`]s from another thread.
//!
//! Either way the pipeline invokes the handler synchronously from inside
//! `process`, on the caller's thread.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The result of one finalized command.
///
/// "Not understood" is a normal completion, not an error: `intent` is
/// `None` and `slots` is empty, and the pipeline has already re-armed
/// itself for the next wake word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inference {
    /// Whether the command matched the loaded grammar.
    pub is_understood: bool,
    /// Recognised intent name. Present iff `is_understood`.
    pub intent: Option<String>,
    /// Slot name → extracted value. Empty iff not understood.
    #[serde(default)]
    pub slots: HashMap<String, String>,
}

impl Inference {
    /// An understood command with its intent and slot values.
    pub fn understood(
        intent: impl Into<String>,
        slots: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            is_understood: true,
            intent: Some(intent.into()),
            slots: slots.into_iter().collect(),
        }
    }

    /// A finalized command that did not match the grammar (or an endpoint
    /// reached with no recognisable speech).
    pub fn not_understood() -> Self {
        Self {
            is_understood: false,
            intent: None,
            slots: HashMap::new(),
        }
    }
}

/// Handler invoked synchronously from within `VoicePipeline::process`.
///
/// Bodies run on whatever thread drives `process` — in a typical
/// deployment that is the audio loop, so they must return quickly and
/// must not block on further audio I/O.
pub trait VoiceEventHandler: Send {
    /// The wake phrase was detected; the pipeline is now accumulating a
    /// command.
    fn on_wake_word(&mut self);

    /// A command was finalized (understood or not) and the pipeline has
    /// re-armed for the next wake word.
    fn on_inference(&mut self, inference: Inference);
}

/// A pipeline event as a plain value, for hosts that prefer message
/// passing over inline callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VoiceEvent {
    /// Wake phrase detected.
    WakeWord,
    /// Command finalized.
    Inference(Inference),
}

/// Forwards each pipeline event into a crossbeam channel.
///
/// The send is non-blocking; if every receiver is gone the event is
/// dropped with a warning rather than stalling the audio loop.
pub struct EventSender {
    tx: Sender<VoiceEvent>,
}

impl EventSender {
    pub fn new(tx: Sender<VoiceEvent>) -> Self {
        Self { tx }
    }
}

impl VoiceEventHandler for EventSender {
    fn on_wake_word(&mut self) {
        if self.tx.try_send(VoiceEvent::WakeWord).is_err() {
            warn!("dropping wake-word event: no receiver");
        }
    }

    fn on_inference(&mut self, inference: Inference) {
        if self.tx.try_send(VoiceEvent::Inference(inference)).is_err() {
            warn!("dropping inference event: no receiver");
        }
    }
}
