//! `VoicePipeline` — the dual-stage controller.
//!
//! ## Frame routing
//!
//! ```text
//! process(frame)
//!     ├─ AwaitingWakeWord ─► wake-word engine ─► detected?
//!     │                                            └─► state = AwaitingCommand
//!     │                                                handler.on_wake_word()
//!     └─ AwaitingCommand ──► intent engine ─────► finalized?
//!                                                  └─► state = AwaitingWakeWord
//!                                                      fetch inference, reset engine
//!                                                      handler.on_inference(..)
//! ```
//!
//! Exactly one engine receives each frame, decided solely by `state`.
//! At most one handler callback fires per `process` call, synchronously
//! on the calling thread. The pipeline owns no threads: the host drives
//! it frame by frame and must serialise calls (`&mut self` makes
//! concurrent use unrepresentable).
//!
//! ## Fault policy
//!
//! Engine faults propagate to the caller mapped into the crate taxonomy,
//! with `state` left where it was, so a subsequent successful call
//! resumes from the same stage. Audio accumulated inside the intent
//! engine may be lost across such a fault; hosts are expected to call
//! [`VoicePipeline::reset`] after handling the error.

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::engines::{EngineProvider, IntentEngine, WakeWordEngine};
use crate::error::{AttuneError, Result};
use crate::events::VoiceEventHandler;

/// Which engine receives the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    /// Every frame goes to the wake-word engine.
    AwaitingWakeWord,
    /// Wake phrase heard; every frame goes to the intent engine.
    AwaitingCommand,
}

/// Two-stage voice pipeline: a wake-word gate in front of a
/// speech-to-intent engine.
pub struct VoicePipeline<H: VoiceEventHandler> {
    state: ListeningState,
    wake: Box<dyn WakeWordEngine>,
    intent: Box<dyn IntentEngine>,
    handler: H,
    sample_rate: u32,
    frame_length: u32,
    version: String,
}

impl<H: VoiceEventHandler> std::fmt::Debug for VoicePipeline<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The boxed engines and handler are not `Debug`; report the
        // plain-value fields so `Result<VoicePipeline>::unwrap_err` and
        // similar diagnostics can format the pipeline.
        f.debug_struct("VoicePipeline")
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("frame_length", &self.frame_length)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<H: VoiceEventHandler> VoicePipeline<H> {
    /// Validate `config`, instantiate both engines through `provider`,
    /// and verify they agree on the audio format.
    ///
    /// Validation runs before either engine exists, so a bad sensitivity
    /// or missing file never touches a native library. If the intent
    /// engine fails to build, the already-built wake-word engine is
    /// released before the error propagates.
    ///
    /// # Errors
    /// - `AttuneError::InvalidArgument` for any violated configuration
    ///   constraint.
    /// - `AttuneError::Runtime` if the engines report different sample
    ///   rates or frame lengths (both are trained against the same audio
    ///   front end, so this indicates mismatched model files).
    /// - Any mapped engine construction failure.
    pub fn new(
        config: &PipelineConfig,
        provider: &mut dyn EngineProvider,
        handler: H,
    ) -> Result<Self> {
        config.validate()?;

        let wake = provider.wake_word(config)?;
        let intent = provider.intent(config)?;

        if wake.sample_rate() != intent.sample_rate() {
            return Err(AttuneError::Runtime(format!(
                "engine sample rates differ: wake-word {} Hz vs intent {} Hz",
                wake.sample_rate(),
                intent.sample_rate()
            )));
        }
        if wake.frame_length() != intent.frame_length() {
            return Err(AttuneError::Runtime(format!(
                "engine frame lengths differ: wake-word {} vs intent {}",
                wake.frame_length(),
                intent.frame_length()
            )));
        }

        let sample_rate = wake.sample_rate();
        let frame_length = wake.frame_length();
        let version = format!(
            "{} (wake-word {}) (intent {})",
            env!("CARGO_PKG_VERSION"),
            wake.version(),
            intent.version()
        );

        info!(sample_rate, frame_length, "voice pipeline ready");

        Ok(Self {
            state: ListeningState::AwaitingWakeWord,
            wake,
            intent,
            handler,
            sample_rate,
            frame_length,
            version,
        })
    }

    /// Route one frame of 16-bit mono PCM to the active engine.
    ///
    /// `frame` must contain exactly [`Self::frame_length`] samples at
    /// [`Self::sample_rate`]; the length is checked on every call, the
    /// rate is the host's contract. At most one handler callback fires
    /// per call.
    pub fn process(&mut self, frame: &[i16]) -> Result<()> {
        if frame.len() != self.frame_length as usize {
            return Err(AttuneError::InvalidArgument(format!(
                "frame holds {} samples, engines expect exactly {}",
                frame.len(),
                self.frame_length
            )));
        }

        match self.state {
            ListeningState::AwaitingWakeWord => {
                if self.wake.process(frame)? {
                    self.state = ListeningState::AwaitingCommand;
                    info!("wake word detected — listening for a command");
                    self.handler.on_wake_word();
                }
            }
            ListeningState::AwaitingCommand => {
                if self.intent.process(frame)? {
                    // Re-arm unconditionally: a misheard command must not
                    // wedge the pipeline in AwaitingCommand.
                    self.state = ListeningState::AwaitingWakeWord;
                    let inference = self.intent.inference()?;
                    self.intent.reset()?;
                    info!(
                        is_understood = inference.is_understood,
                        intent = inference.intent.as_deref().unwrap_or("-"),
                        "command finalized"
                    );
                    self.handler.on_inference(inference);
                }
            }
        }

        Ok(())
    }

    /// Force the pipeline back to wake-word listening and clear the
    /// intent engine's accumulated command buffer.
    ///
    /// Call after an error, a deliberate session restart, or when
    /// resuming a stopped audio stream (a silence gap would otherwise
    /// skew the intent engine's endpoint timing). Idempotent.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == ListeningState::AwaitingCommand {
            warn!("pipeline reset while a command was being captured");
        }
        self.state = ListeningState::AwaitingWakeWord;
        self.intent.reset()
    }

    /// Which engine currently receives frames.
    pub fn state(&self) -> ListeningState {
        self.state
    }

    /// Sample rate both engines expect (Hz).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per frame both engines expect.
    pub fn frame_length(&self) -> u32 {
        self.frame_length
    }

    /// Pipeline version, including both engine versions.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Human-readable description of the loaded grammar.
    pub fn context_info(&self) -> String {
        self.intent.context_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::engines::scripted::{
        ScriptedIntent, ScriptedProvider, ScriptedWakeWord, SCRIPTED_FRAME_LENGTH,
    };
    use crate::events::{Inference, VoiceEvent};

    const FRAME_LENGTH: usize = SCRIPTED_FRAME_LENGTH as usize;

    /// Records every callback as a `VoiceEvent`, shared with the test body.
    #[derive(Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<VoiceEvent>>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn events(&self) -> Vec<VoiceEvent> {
            self.events.lock().clone()
        }
    }

    impl VoiceEventHandler for Recorder {
        fn on_wake_word(&mut self) {
            self.events.lock().push(VoiceEvent::WakeWord);
        }

        fn on_inference(&mut self, inference: Inference) {
            self.events.lock().push(VoiceEvent::Inference(inference));
        }
    }

    /// Wake-word double that counts `process` calls and optionally fails.
    struct CountingWake {
        calls: Arc<AtomicUsize>,
        detect_at_call: Option<usize>,
        fail: bool,
    }

    impl WakeWordEngine for CountingWake {
        fn process(&mut self, _frame: &[i16]) -> Result<bool> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(AttuneError::Runtime("intentional wake fault".into()));
            }
            Ok(self.detect_at_call == Some(call))
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }

        fn frame_length(&self) -> u32 {
            SCRIPTED_FRAME_LENGTH
        }

        fn version(&self) -> String {
            "counting".into()
        }
    }

    /// Intent double with call/reset counters and scripted faults.
    struct CountingIntent {
        calls: Arc<AtomicUsize>,
        resets: Arc<AtomicUsize>,
        finalize_at_call: Option<usize>,
        fail_process: bool,
        inference: Inference,
    }

    impl CountingIntent {
        fn new(
            calls: Arc<AtomicUsize>,
            resets: Arc<AtomicUsize>,
            finalize_at_call: Option<usize>,
        ) -> Self {
            Self {
                calls,
                resets,
                finalize_at_call,
                fail_process: false,
                inference: Inference::not_understood(),
            }
        }
    }

    impl IntentEngine for CountingIntent {
        fn process(&mut self, _frame: &[i16]) -> Result<bool> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_process {
                return Err(AttuneError::Runtime("intentional intent fault".into()));
            }
            Ok(self.finalize_at_call == Some(call))
        }

        fn inference(&mut self) -> Result<Inference> {
            Ok(self.inference.clone())
        }

        fn reset(&mut self) -> Result<()> {
            self.resets.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn context_info(&self) -> String {
            "counting grammar".into()
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }

        fn frame_length(&self) -> u32 {
            SCRIPTED_FRAME_LENGTH
        }

        fn version(&self) -> String {
            "counting".into()
        }
    }

    /// Provider that counts how many engines it has built.
    struct CountingProvider {
        built: Arc<AtomicUsize>,
        inner: ScriptedProvider,
    }

    impl EngineProvider for CountingProvider {
        fn wake_word(&mut self, config: &PipelineConfig) -> Result<Box<dyn WakeWordEngine>> {
            self.built.fetch_add(1, Ordering::Relaxed);
            self.inner.wake_word(config)
        }

        fn intent(&mut self, config: &PipelineConfig) -> Result<Box<dyn IntentEngine>> {
            self.built.fetch_add(1, Ordering::Relaxed);
            self.inner.intent(config)
        }
    }

    fn frame() -> Vec<i16> {
        vec![0i16; FRAME_LENGTH]
    }

    fn valid_config(dir: &tempfile::TempDir) -> PipelineConfig {
        let keyword = dir.path().join("hey.ppn");
        let context = dir.path().join("coffee.rhn");
        std::fs::File::create(&keyword).unwrap();
        std::fs::File::create(&context).unwrap();
        PipelineConfig::new("key", keyword, context)
    }

    fn scripted_pipeline(
        wake: ScriptedWakeWord,
        intent: ScriptedIntent,
    ) -> (VoicePipeline<Recorder>, Recorder) {
        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let recorder = Recorder::new();
        let mut provider = ScriptedProvider::new(wake, intent);
        let pipeline = VoicePipeline::new(&config, &mut provider, recorder.clone())
            .expect("scripted pipeline should build");
        (pipeline, recorder)
    }

    #[test]
    fn reports_the_shared_audio_format() {
        let (pipeline, _recorder) = scripted_pipeline(
            ScriptedWakeWord::every(4),
            ScriptedIntent::new(4, vec![Inference::not_understood()]),
        );
        assert_eq!(pipeline.sample_rate(), 16_000);
        assert_eq!(pipeline.frame_length(), SCRIPTED_FRAME_LENGTH);
        assert!(pipeline.version().contains("wake-word"));
        assert_eq!(pipeline.context_info(), "scripted grammar");
    }

    #[test]
    fn construction_fails_on_sample_rate_mismatch() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(
            ScriptedWakeWord::every(4).with_format(8_000, SCRIPTED_FRAME_LENGTH),
            ScriptedIntent::new(4, vec![Inference::not_understood()]),
        );

        let err = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap_err();
        assert!(matches!(err, AttuneError::Runtime(_)), "got {err:?}");
    }

    #[test]
    fn construction_fails_on_frame_length_mismatch() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(
            ScriptedWakeWord::every(4).with_format(16_000, 256),
            ScriptedIntent::new(4, vec![Inference::not_understood()]),
        );

        let err = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap_err();
        assert!(matches!(err, AttuneError::Runtime(_)), "got {err:?}");
    }

    #[test]
    fn invalid_config_fails_before_any_engine_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.wake_sensitivity = 1.5;

        let built = Arc::new(AtomicUsize::new(0));
        let mut provider = CountingProvider {
            built: Arc::clone(&built),
            inner: ScriptedProvider::new(
                ScriptedWakeWord::every(4),
                ScriptedIntent::new(4, vec![Inference::not_understood()]),
            ),
        };

        let err = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap_err();
        assert!(matches!(err, AttuneError::InvalidArgument(_)), "got {err:?}");
        assert_eq!(built.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn undetected_frames_keep_state_and_fire_nothing() {
        let (mut pipeline, recorder) = scripted_pipeline(
            ScriptedWakeWord::detect_at([100]),
            ScriptedIntent::new(4, vec![Inference::not_understood()]),
        );

        for _ in 0..20 {
            pipeline.process(&frame()).unwrap();
        }

        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn detection_flips_state_and_fires_exactly_one_callback() {
        let (mut pipeline, recorder) = scripted_pipeline(
            ScriptedWakeWord::detect_at([2]),
            ScriptedIntent::new(100, vec![Inference::not_understood()]),
        );

        for _ in 0..3 {
            pipeline.process(&frame()).unwrap();
        }

        assert_eq!(pipeline.state(), ListeningState::AwaitingCommand);
        assert_eq!(recorder.events(), vec![VoiceEvent::WakeWord]);

        // More frames go to the intent engine; no premature re-arming.
        for _ in 0..10 {
            pipeline.process(&frame()).unwrap();
        }
        assert_eq!(pipeline.state(), ListeningState::AwaitingCommand);
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn finalization_re_arms_for_both_understood_branches() {
        for inference in [
            Inference::understood("orderBeverage", [("size".into(), "large".into())]),
            Inference::not_understood(),
        ] {
            let (mut pipeline, recorder) = scripted_pipeline(
                ScriptedWakeWord::detect_at([0]),
                ScriptedIntent::new(2, vec![inference.clone()]),
            );

            pipeline.process(&frame()).unwrap(); // wake
            pipeline.process(&frame()).unwrap(); // command frame 1
            pipeline.process(&frame()).unwrap(); // command frame 2 → finalized

            assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
            assert_eq!(
                recorder.events(),
                vec![VoiceEvent::WakeWord, VoiceEvent::Inference(inference)]
            );
        }
    }

    #[test]
    fn intent_engine_is_reset_after_each_finalization() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resets = Arc::new(AtomicUsize::new(0));
        let intent = CountingIntent::new(Arc::clone(&calls), Arc::clone(&resets), Some(0));

        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(ScriptedWakeWord::detect_at([0]), intent);
        let mut pipeline = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap();

        pipeline.process(&frame()).unwrap(); // wake
        pipeline.process(&frame()).unwrap(); // finalize immediately

        assert_eq!(resets.load(Ordering::Relaxed), 1);
        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
    }

    #[test]
    fn wrong_frame_length_fails_without_touching_engines_or_state() {
        let wake_calls = Arc::new(AtomicUsize::new(0));
        let intent_calls = Arc::new(AtomicUsize::new(0));
        let resets = Arc::new(AtomicUsize::new(0));

        let wake = CountingWake {
            calls: Arc::clone(&wake_calls),
            detect_at_call: None,
            fail: false,
        };
        let intent = CountingIntent::new(Arc::clone(&intent_calls), resets, None);

        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(wake, intent);
        let mut pipeline = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap();

        let short = vec![0i16; FRAME_LENGTH - 1];
        let err = pipeline.process(&short).unwrap_err();
        assert!(matches!(err, AttuneError::InvalidArgument(_)), "got {err:?}");

        let long = vec![0i16; FRAME_LENGTH + 1];
        assert!(pipeline.process(&long).is_err());

        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
        assert_eq!(wake_calls.load(Ordering::Relaxed), 0);
        assert_eq!(intent_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn engine_fault_propagates_with_state_unchanged() {
        let wake_calls = Arc::new(AtomicUsize::new(0));
        let wake = CountingWake {
            calls: Arc::clone(&wake_calls),
            detect_at_call: None,
            fail: true,
        };
        let intent = CountingIntent::new(
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
            None,
        );

        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(wake, intent);
        let mut pipeline = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap();

        let err = pipeline.process(&frame()).unwrap_err();
        assert!(matches!(err, AttuneError::Runtime(_)), "got {err:?}");
        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
    }

    #[test]
    fn command_stage_fault_leaves_pipeline_in_command_stage() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resets = Arc::new(AtomicUsize::new(0));
        let mut intent = CountingIntent::new(Arc::clone(&calls), Arc::clone(&resets), None);
        intent.fail_process = true;

        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(ScriptedWakeWord::detect_at([0]), intent);
        let mut pipeline = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap();

        pipeline.process(&frame()).unwrap(); // wake
        assert_eq!(pipeline.state(), ListeningState::AwaitingCommand);

        let err = pipeline.process(&frame()).unwrap_err();
        assert!(matches!(err, AttuneError::Runtime(_)), "got {err:?}");
        // Fault does not silently re-arm: the host decides via reset().
        assert_eq!(pipeline.state(), ListeningState::AwaitingCommand);

        pipeline.reset().unwrap();
        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);
        assert_eq!(resets.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn reset_is_idempotent_and_always_resets_the_intent_engine() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resets = Arc::new(AtomicUsize::new(0));
        let intent = CountingIntent::new(Arc::clone(&calls), Arc::clone(&resets), None);

        let dir = tempfile::TempDir::new().unwrap();
        let config = valid_config(&dir);
        let mut provider = ScriptedProvider::new(ScriptedWakeWord::detect_at([0]), intent);
        let mut pipeline = VoicePipeline::new(&config, &mut provider, Recorder::new()).unwrap();

        // From AwaitingWakeWord: a no-op that still resets the engine.
        pipeline.reset().unwrap();
        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);

        // From AwaitingCommand.
        pipeline.process(&frame()).unwrap();
        assert_eq!(pipeline.state(), ListeningState::AwaitingCommand);
        pipeline.reset().unwrap();
        assert_eq!(pipeline.state(), ListeningState::AwaitingWakeWord);

        assert_eq!(resets.load(Ordering::Relaxed), 2);
    }
}
