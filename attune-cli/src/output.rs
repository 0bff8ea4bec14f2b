//! Terminal rendering of pipeline events.

use attune_core::{Inference, VoiceEvent, VoiceEventHandler};
use chrono::Local;

pub fn print_event(event: &VoiceEvent) {
    match event {
        VoiceEvent::WakeWord => {
            println!("[{}] [wake word]", Local::now().format("%F %T"));
        }
        VoiceEvent::Inference(inference) => print_inference(inference),
    }
}

fn print_inference(inference: &Inference) {
    let stamp = Local::now().format("%F %T");
    if inference.is_understood {
        println!("[{stamp}] inferred:");
        println!("{{");
        println!("    intent : '{}'", inference.intent.as_deref().unwrap_or(""));
        println!("    slots : {{");
        let mut slots: Vec<_> = inference.slots.iter().collect();
        slots.sort();
        for (slot, value) in slots {
            println!("        {slot} : {value}");
        }
        println!("    }}");
        println!("}}");
    } else {
        println!("[{stamp}] did not understand the command");
    }
}

/// Inline handler for single-threaded hosts (the file demo).
pub struct PrintHandler;

impl VoiceEventHandler for PrintHandler {
    fn on_wake_word(&mut self) {
        print_event(&VoiceEvent::WakeWord);
    }

    fn on_inference(&mut self, inference: Inference) {
        print_event(&VoiceEvent::Inference(inference));
    }
}
