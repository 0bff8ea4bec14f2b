//! Shared engine arguments: CLI flags layered over an optional JSON
//! settings file, and provider selection (vendor engines vs. scripted
//! stub mode).

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use attune_core::engines::scripted::{ScriptedIntent, ScriptedProvider, ScriptedWakeWord};
use attune_core::{EngineProvider, Inference, PipelineConfig};
use clap::Args;
use tempfile::TempDir;

/// Stub-mode pacing: roughly 3 s of wake listening and 2 s of command
/// audio at 512-sample frames / 16 kHz.
const STUB_WAKE_PERIOD_FRAMES: u64 = 94;
const STUB_COMMAND_FRAMES: u64 = 63;

#[derive(Debug, Args)]
pub struct EngineArgs {
    /// JSON settings file holding a full pipeline configuration;
    /// individual flags below override its values
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Access key for the vendor engines
    #[arg(long, env = "ATTUNE_ACCESS_KEY", default_value = "", hide_default_value = true)]
    pub access_key: String,

    /// Wake-word keyword model (.ppn)
    #[arg(long, value_name = "PATH")]
    pub keyword: Option<PathBuf>,

    /// Intent context model (.rhn)
    #[arg(long, value_name = "PATH")]
    pub context: Option<PathBuf>,

    /// Wake-word sensitivity in [0, 1]
    #[arg(long)]
    pub wake_sensitivity: Option<f32>,

    /// Intent sensitivity in [0, 1]
    #[arg(long)]
    pub intent_sensitivity: Option<f32>,

    /// Endpoint duration in seconds, within [0.5, 5]
    #[arg(long)]
    pub endpoint_duration: Option<f32>,

    /// Let the intent engine finalize as soon as the command is
    /// unambiguous instead of waiting for the endpoint
    #[arg(long)]
    pub no_require_endpoint: bool,

    /// Run on deterministic scripted engines — no models or key needed
    #[arg(long)]
    pub stub: bool,
}

impl EngineArgs {
    /// Assemble the pipeline configuration. The returned guard (stub
    /// mode only) keeps placeholder model files alive for the session.
    pub fn resolve_config(&self) -> anyhow::Result<(PipelineConfig, Option<TempDir>)> {
        if self.stub {
            let (config, guard) = stub_config()?;
            return Ok((config, Some(guard)));
        }

        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading settings file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing settings file {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if !self.access_key.is_empty() {
            config.access_key = self.access_key.clone();
        }
        if let Some(keyword) = &self.keyword {
            config.keyword_path = keyword.clone();
        }
        if let Some(context) = &self.context {
            config.context_path = context.clone();
        }
        if let Some(sensitivity) = self.wake_sensitivity {
            config.wake_sensitivity = sensitivity;
        }
        if let Some(sensitivity) = self.intent_sensitivity {
            config.intent_sensitivity = sensitivity;
        }
        if let Some(duration) = self.endpoint_duration {
            config.endpoint_duration_sec = duration;
        }
        if self.no_require_endpoint {
            config.require_endpoint = false;
        }

        Ok((config, None))
    }

    /// Pick the engine provider for this run.
    pub fn provider(&self) -> anyhow::Result<Box<dyn EngineProvider>> {
        if self.stub {
            return Ok(Box::new(stub_provider()));
        }

        #[cfg(feature = "picovoice")]
        return Ok(Box::new(attune_core::PicovoiceProvider));

        #[cfg(not(feature = "picovoice"))]
        Err(anyhow::anyhow!(
            "this binary was built without the `picovoice` feature; \
             rebuild with `--features picovoice` or pass --stub"
        ))
    }
}

/// Scripted engines that walk through a believable demo session:
/// periodic wake words, then an understood coffee order alternating
/// with a not-understood command.
fn stub_provider() -> ScriptedProvider {
    let script = vec![
        Inference::understood(
            "orderBeverage",
            [
                ("size".to_string(), "large".to_string()),
                ("beverage".to_string(), "coffee".to_string()),
            ],
        ),
        Inference::not_understood(),
    ];
    ScriptedProvider::new(
        ScriptedWakeWord::every(STUB_WAKE_PERIOD_FRAMES),
        ScriptedIntent::new(STUB_COMMAND_FRAMES, script)
            .with_context_info("stub grammar: orderBeverage(size, beverage)"),
    )
}

/// Placeholder configuration for stub mode. The scripted engines never
/// read the model files, but construction still validates the paths, so
/// empty placeholders are created in a temp dir.
fn stub_config() -> anyhow::Result<(PipelineConfig, TempDir)> {
    let dir = TempDir::new().context("creating stub model dir")?;
    let keyword = dir.path().join("stub_keyword.ppn");
    let context = dir.path().join("stub_context.rhn");
    fs::File::create(&keyword)?;
    fs::File::create(&context)?;
    Ok((PipelineConfig::new("stub", keyword, context), dir))
}
