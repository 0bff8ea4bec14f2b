//! End-to-end pipeline scenarios over scripted engines: a full session
//! is simulated frame by frame through the public API, with events
//! collected over the channel-based emitter.

use std::fs::File;

use attune_core::audio::FrameAssembler;
use attune_core::engines::scripted::{
    ScriptedIntent, ScriptedProvider, ScriptedWakeWord, SCRIPTED_FRAME_LENGTH,
};
use attune_core::{
    EventSender, Inference, ListeningState, PipelineConfig, VoiceEvent, VoicePipeline,
};
use crossbeam_channel::Receiver;
use tempfile::TempDir;

const FRAME_LENGTH: usize = SCRIPTED_FRAME_LENGTH as usize;

/// Frames of wake-word audio before the trigger fires (scripted).
const WAKE_FRAMES: u64 = 3;
/// Frames of command audio before the scripted intent engine endpoints.
const COMMAND_FRAMES: u64 = 4;

fn demo_config(dir: &TempDir) -> PipelineConfig {
    let keyword = dir.path().join("hey_attune.ppn");
    let context = dir.path().join("coffee_maker.rhn");
    File::create(&keyword).unwrap();
    File::create(&context).unwrap();
    PipelineConfig::new("integration-test-key", keyword, context)
}

fn coffee_inference() -> Inference {
    Inference::understood(
        "orderBeverage",
        [
            ("size".to_string(), "large".to_string()),
            ("beverage".to_string(), "coffee".to_string()),
        ],
    )
}

fn scripted_session(
    script: Vec<Inference>,
) -> (VoicePipeline<EventSender>, Receiver<VoiceEvent>) {
    let dir = TempDir::new().unwrap();
    let config = demo_config(&dir);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut provider = ScriptedProvider::new(
        ScriptedWakeWord::every(WAKE_FRAMES),
        ScriptedIntent::new(COMMAND_FRAMES, script),
    );
    let pipeline = VoicePipeline::new(&config, &mut provider, EventSender::new(tx))
        .expect("pipeline should build");
    (pipeline, rx)
}

/// One simulated utterance: wake phrase then a command.
fn feed_utterance(pipeline: &mut VoicePipeline<EventSender>) {
    let frame = vec![0i16; FRAME_LENGTH];
    for _ in 0..WAKE_FRAMES + COMMAND_FRAMES {
        pipeline.process(&frame).expect("process should succeed");
    }
}

#[test]
fn wake_phrase_then_command_yields_one_wake_and_one_inference() {
    let (mut pipeline, rx) = scripted_session(vec![coffee_inference()]);

    feed_utterance(&mut pipeline);

    let events: Vec<VoiceEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            VoiceEvent::WakeWord,
            VoiceEvent::Inference(coffee_inference()),
        ]
    );
    assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
}

#[test]
fn back_to_back_utterances_need_no_explicit_reset() {
    let (mut pipeline, rx) = scripted_session(vec![coffee_inference()]);

    // Same "audio" twice through one pipeline instance.
    feed_utterance(&mut pipeline);
    feed_utterance(&mut pipeline);

    let events: Vec<VoiceEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            VoiceEvent::WakeWord,
            VoiceEvent::Inference(coffee_inference()),
            VoiceEvent::WakeWord,
            VoiceEvent::Inference(coffee_inference()),
        ]
    );
    assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
}

#[test]
fn endpoint_without_speech_completes_as_not_understood() {
    let (mut pipeline, rx) = scripted_session(vec![Inference::not_understood()]);

    feed_utterance(&mut pipeline);

    let events: Vec<VoiceEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    match &events[1] {
        VoiceEvent::Inference(inference) => {
            assert!(!inference.is_understood);
            assert!(inference.intent.is_none());
            assert!(inference.slots.is_empty());
        }
        other => panic!("expected an inference event, got {other:?}"),
    }
    assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
}

#[test]
fn capture_plumbing_produces_frames_the_pipeline_accepts() {
    let (mut pipeline, rx) = scripted_session(vec![coffee_inference()]);

    // Synthetic 48 kHz capture audio, framed exactly like the mic demo
    // does it: resample to the engine rate, quantise, slice.
    let mut assembler =
        FrameAssembler::new(48_000, pipeline.sample_rate(), pipeline.frame_length()).unwrap();
    let captured: Vec<f32> = (0..48_000)
        .map(|i| (i as f32 * 0.05).sin() * 0.3)
        .collect();

    for chunk in captured.chunks(960) {
        assembler.push(chunk);
        while let Some(frame) = assembler.next_frame() {
            pipeline.process(&frame).expect("frame length must match");
        }
    }

    // One second of audio is more than enough scripted frames for a full
    // wake + command cycle.
    let events: Vec<VoiceEvent> = rx.try_iter().collect();
    assert!(
        events.len() >= 2,
        "expected at least one wake + inference, got {events:?}"
    );
    assert_eq!(events[0], VoiceEvent::WakeWord);
}
