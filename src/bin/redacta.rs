use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use redacta_lib::models::{HumanizeConfig, Intensity, PipelineOutput, StepStatus};
use redacta_lib::services::config_store::ConfigStore;
use redacta_lib::services::file_loader::{decode_text, load_file};
use redacta_lib::services::pipeline::{
    run_paced, LoggingObserver, PacingOptions, Pipeline, PipelineError, TraceEvent, TraceObserver,
};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

const USAGE: &str = "Usage:
  redacta <file|-> [--intensity light|medium|aggressive] [--seed <n>] [--no-colloquial]
          [--no-perturb] [--mix-sources] [--no-optimize] [--no-style] [--sort-by-length]
          [--paced | --pace-ms <n>] [--config <dir>] [--save-settings] [--json] [--out <path>]

Notes:
  - `-` reads the text from stdin. .txt, .md, .docx and .pdf files are accepted.
  - Flags override the stored settings; --save-settings writes the result back.
  - --paced follows the steps at the interactive delay; --pace-ms sets it explicitly.
  - Ctrl-C cancels the run between stages.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("read stdin failed")?;
        return Ok(decode_text(&bytes));
    }
    load_file(&PathBuf::from(source)).with_context(|| format!("load {} failed", source))
}

/// Stored settings with command-line overrides applied on top.
fn resolve_config(args: &[String], stored: HumanizeConfig) -> Result<HumanizeConfig> {
    let mut config = stored;
    if let Some(level) = parse_arg_value(args, "--intensity") {
        config.intensity = match level.trim().to_lowercase().as_str() {
            "light" | "medium" | "aggressive" => Intensity::from_str(&level),
            other => bail!("unknown intensity: {}", other),
        };
    }
    if has_flag(args, "--no-colloquial") {
        config.enable_colloquialisms = false;
    }
    if has_flag(args, "--no-perturb") {
        config.enable_syntax_perturbation = false;
    }
    if has_flag(args, "--mix-sources") {
        config.enable_source_mixing = true;
    }
    if has_flag(args, "--no-optimize") {
        config.enable_auto_optimize = false;
    }
    if has_flag(args, "--no-style") {
        config.enable_style_variation = false;
    }
    if has_flag(args, "--sort-by-length") {
        config.sort_sentences_by_length = true;
    }
    Ok(config)
}

/// Prints finished steps to stderr and forwards everything to the log.
struct ProgressObserver {
    quiet: bool,
}

impl TraceObserver for ProgressObserver {
    fn on_event(&mut self, event: &TraceEvent) {
        LoggingObserver.on_event(event);
        if self.quiet {
            return;
        }
        if let TraceEvent::StepChanged { step, .. } = event {
            match (step.status, step.score) {
                (StepStatus::Done, Some(score)) => eprintln!("  [done] {} ({:.1})", step.name, score),
                (StepStatus::Done, None) => eprintln!("  [done] {}", step.name),
                (StepStatus::Failed, _) => eprintln!("  [failed] {}", step.name),
                _ => {}
            }
        }
    }
}

fn print_summary(output: &PipelineOutput) {
    eprintln!();
    eprintln!("Score: {:.1} ({})", output.score, if output.accepted { "accepted" } else { "below threshold" });
    eprintln!("Optimization attempts: {}", output.optimization_attempts);
    if let Some(ref b) = output.breakdown {
        let s = &b.signals;
        eprintln!(
            "Signals (AI-likelihood): uniformity={:.0} diversity={:.0} rhythm={:.0} markers={:.0} artifacts={:.0}",
            s.length_uniformity, s.vocabulary_diversity, s.paragraph_rhythm, s.human_markers, s.perturbation_artifacts
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") || has_flag(&args, "-h") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    redacta_lib::init_logging();

    let source = args[1].clone();
    let json = has_flag(&args, "--json");
    let out_path = parse_arg_value(&args, "--out");
    let seed: Option<u64> = match parse_arg_value(&args, "--seed") {
        Some(s) => Some(s.parse().with_context(|| format!("invalid seed: {}", s))?),
        None => None,
    };
    let pace_ms: Option<u64> = parse_arg_value(&args, "--pace-ms").and_then(|s| s.parse().ok());
    let paced = has_flag(&args, "--paced");

    let store_dir = parse_arg_value(&args, "--config")
        .map(PathBuf::from)
        .or_else(ConfigStore::default_config_dir);
    let store = store_dir.map(ConfigStore::new);

    let stored = match store.as_ref().map(|s| s.load_humanize()) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            warn!("[CLI] stored settings unreadable, using defaults: {}", e);
            HumanizeConfig::default()
        }
        None => HumanizeConfig::default(),
    };
    let config = resolve_config(&args, stored)?;
    let text = read_input(&source)?;

    if has_flag(&args, "--save-settings") {
        match store.as_ref() {
            Some(store) => {
                store.save_humanize(&config).context("save settings failed")?;
                store.save_last_text(&text).context("save last text failed")?;
                eprintln!("Settings saved to {}", store.config_dir().display());
            }
            None => warn!("[CLI] no config directory available, settings not saved"),
        }
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    info!(
        "[CLI] {}: {} chars, intensity={}, seed={:?}",
        source,
        text.chars().count(),
        config.intensity.as_str(),
        seed
    );

    let pipeline = Pipeline::standard();
    let mut observer = ProgressObserver { quiet: json };
    let options = match pace_ms {
        Some(ms) => PacingOptions {
            delay: Duration::from_millis(ms),
            cancel: Some(cancel_rx),
        },
        None if paced => PacingOptions::interactive(cancel_rx),
        None => PacingOptions {
            cancel: Some(cancel_rx),
            ..PacingOptions::default()
        },
    };

    let output = match run_paced(&pipeline, &text, &config, &mut rng, &mut observer, options).await {
        Ok(output) => output,
        Err(PipelineError::Cancelled) => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        Err(e) => bail!(e),
    };

    let rendered = if json {
        serde_json::to_string_pretty(&output).context("serialize output failed")?
    } else {
        output.output_text.clone()
    };

    match out_path {
        Some(path) => {
            std::fs::write(&path, &rendered).with_context(|| format!("write {} failed", path))?;
            eprintln!("Wrote: {}", path);
        }
        None => println!("{}", rendered),
    }

    if !json {
        print_summary(&output);
    }

    Ok(())
}
