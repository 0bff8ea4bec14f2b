//! Attune demo CLI.
//!
//! Two hosts for the voice pipeline — a live microphone session and a
//! WAV file runner — plus an input-device listing. Both hosts print
//! wake-word and inference events as they fire. Without the `picovoice`
//! feature (or with `--stub`) the pipeline runs on deterministic
//! scripted engines, so the full frame path can be exercised with no
//! vendor models or access key.

mod file;
mod mic;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "attune", version, about = "Wake-word + speech-to-intent pipeline demos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listen on a microphone and print pipeline events
    Mic(mic::MicArgs),
    /// Feed a 16-bit mono WAV file through the pipeline
    File(file::FileArgs),
    /// List available audio input devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Mic(args) => mic::run(args),
        Command::File(args) => file::run(args),
        Command::Devices => mic::list_devices(),
    }
}
