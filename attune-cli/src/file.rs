//! WAV file runner: frames a pre-recorded file through the pipeline.

use std::path::PathBuf;

use anyhow::{bail, Context};
use attune_core::VoicePipeline;
use clap::Args;
use tracing::{info, warn};

use crate::output::PrintHandler;
use crate::settings::EngineArgs;

#[derive(Args)]
pub struct FileArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// WAV file to process: 16-bit integer PCM, mono, at the engine rate
    #[arg(long, short, value_name = "PATH")]
    pub input: PathBuf,
}

pub fn run(args: FileArgs) -> anyhow::Result<()> {
    let (config, _stub_guard) = args.engine.resolve_config()?;
    let mut provider = args.engine.provider()?;
    let mut pipeline = VoicePipeline::new(&config, provider.as_mut(), PrintHandler)
        .context("building voice pipeline")?;

    let mut reader = hound::WavReader::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        bail!("input must be mono, got {} channels", spec.channels);
    }
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        bail!("input must be 16-bit integer PCM");
    }
    if spec.sample_rate != pipeline.sample_rate() {
        bail!(
            "input sample rate {} Hz does not match the engine rate {} Hz",
            spec.sample_rate,
            pipeline.sample_rate()
        );
    }

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .context("reading samples")?;

    let frame_length = pipeline.frame_length() as usize;
    let mut frames_fed = 0usize;
    for frame in samples.chunks_exact(frame_length) {
        pipeline.process(frame).context("processing frame")?;
        frames_fed += 1;
    }

    let leftover = samples.len() % frame_length;
    if leftover != 0 {
        warn!(leftover, "trailing samples shorter than one frame were skipped");
    }
    info!(frames_fed, "file processed");
    Ok(())
}
