//! Live microphone session.
//!
//! Layout mirrors the SDK's intended deployment: the cpal callback
//! pushes device-rate samples into the SPSC ring; a worker thread drains
//! the ring, assembles engine-rate frames and drives
//! `VoicePipeline::process`; the main thread prints events received over
//! the crossbeam channel until Ctrl-C.
//!
//! The cpal stream is `!Send`, so the capture handle is opened inside
//! the worker thread and dropped there.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use attune_core::audio::{AudioCapture, FrameAssembler};
use attune_core::buffering::{create_audio_ring, Consumer};
use attune_core::{EventSender, VoicePipeline};
use clap::Args;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::info;

use crate::output;
use crate::settings::EngineArgs;

/// Samples drained from the ring per iteration (20 ms at 48 kHz).
const DRAIN_CHUNK: usize = 960;

/// Sleep while the ring is empty, to avoid spinning a core.
const SLEEP_EMPTY: Duration = Duration::from_millis(5);

#[derive(Args)]
pub struct MicArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Input device name (see `attune devices`); default input otherwise
    #[arg(long)]
    pub device: Option<String>,

    /// Record the engine-rate audio fed to the pipeline into a WAV file
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,
}

pub fn run(args: MicArgs) -> anyhow::Result<()> {
    let (config, _stub_guard) = args.engine.resolve_config()?;
    let mut provider = args.engine.provider()?;

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let mut pipeline = VoicePipeline::new(&config, provider.as_mut(), EventSender::new(event_tx))
        .context("building voice pipeline")?;

    println!("attune {}", pipeline.version());
    println!("context:\n{}", pipeline.context_info());
    println!("listening — press Ctrl-C to stop");

    let running = Arc::new(AtomicBool::new(true));
    ctrlc::set_handler({
        let running = Arc::clone(&running);
        move || running.store(false, Ordering::SeqCst)
    })
    .context("installing Ctrl-C handler")?;

    let (producer, mut consumer) = create_audio_ring();
    let device = args.device.clone();
    let output_path = args.output_path.clone();

    let worker = thread::spawn({
        let running = Arc::clone(&running);
        move || -> anyhow::Result<()> {
            let capture = AudioCapture::open(producer, Arc::clone(&running), device.as_deref())
                .context("opening audio capture")?;
            let mut assembler = FrameAssembler::new(
                capture.sample_rate,
                pipeline.sample_rate(),
                pipeline.frame_length(),
            )?;

            let mut recorder = match &output_path {
                Some(path) => Some(
                    hound::WavWriter::create(
                        path,
                        hound::WavSpec {
                            channels: 1,
                            sample_rate: pipeline.sample_rate(),
                            bits_per_sample: 16,
                            sample_format: hound::SampleFormat::Int,
                        },
                    )
                    .context("opening recording file")?,
                ),
                None => None,
            };

            let mut raw = vec![0f32; DRAIN_CHUNK];
            while running.load(Ordering::Relaxed) {
                let drained = consumer.pop_slice(&mut raw);
                if drained == 0 {
                    thread::sleep(SLEEP_EMPTY);
                    continue;
                }

                assembler.push(&raw[..drained]);
                while let Some(frame) = assembler.next_frame() {
                    if let Some(recorder) = recorder.as_mut() {
                        for sample in &frame {
                            recorder.write_sample(*sample)?;
                        }
                    }
                    pipeline.process(&frame)?;
                }
            }

            if let Some(recorder) = recorder {
                recorder.finalize()?;
            }
            info!("microphone session stopped");
            Ok(())
        }
    });

    // Ends when the worker drops the pipeline (and with it the sender).
    for event in event_rx.iter() {
        output::print_event(&event);
    }

    worker
        .join()
        .map_err(|_| anyhow::anyhow!("capture thread panicked"))?
}

pub fn list_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    println!("input devices:");
    for device in host.input_devices().context("enumerating input devices")? {
        let name = device.name().unwrap_or_else(|_| "<unknown>".into());
        if name == default_name {
            println!("  {name} (default)");
        } else {
            println!("  {name}");
        }
    }
    Ok(())
}
