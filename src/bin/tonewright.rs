//! Command line renderer: score or demo in, WAV file out, then playback.
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tonewright::{
    config::{DEFAULT_OUTPUT, RenderConfig},
    playback::{PlaybackMode, PlaybackOutcome},
    preset,
    score::Score,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DEMO: &str = "fur-elise";

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Score file (JSON) to render
    #[arg(long, conflicts_with = "demo")]
    score: Option<PathBuf>,
    /// Built-in demo to render (see --list-demos)
    #[arg(long)]
    demo: Option<String>,
    /// Output WAV path
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Override the score's sample rate
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,
    /// Override the normalization peak, in (0, 1]
    #[arg(long)]
    peak: Option<f64>,
    /// Only write the file
    #[arg(long)]
    no_play: bool,
    /// Start playback and exit without waiting for it to finish
    #[arg(long)]
    no_wait: bool,
    /// Print the score as JSON instead of rendering it
    #[arg(long)]
    print_score: bool,
    /// List the built-in demos and instruments
    #[arg(long)]
    list_demos: bool,
}

impl Args {
    fn playback(&self) -> PlaybackMode {
        if self.no_play {
            PlaybackMode::Off
        } else if self.no_wait {
            PlaybackMode::Start
        } else {
            PlaybackMode::Wait
        }
    }

    fn load_score(&self) -> Result<Score> {
        match &self.score {
            Some(path) => Score::load(path)
                .with_context(|| format!("failed to load score: {}", path.display())),
            None => {
                let name = self.demo.as_deref().unwrap_or(DEFAULT_DEMO);
                Ok(preset::demo(name)?)
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.list_demos {
        println!("Demos:");
        for name in preset::DEMO_NAMES {
            println!("  {name}");
        }
        println!("Instruments:");
        for name in preset::INSTRUMENT_NAMES {
            println!("  {name}");
        }
        return Ok(());
    }

    let score = args.load_score()?;
    if args.print_score {
        println!("{}", score.to_json()?);
        return Ok(());
    }

    let config = RenderConfig {
        sample_rate: args.sample_rate,
        target_peak: args.peak,
        output: args.output.clone(),
        playback: args.playback(),
    };
    let report = tonewright::run(&score, &config)
        .with_context(|| format!("failed to render '{}'", score.name))?;

    println!(
        "Saved {} ({:.2} s, {} samples)",
        report.path.display(),
        report.seconds,
        report.samples
    );
    match &report.playback {
        PlaybackOutcome::SavedOnly if config.playback != PlaybackMode::Off => {
            println!("No audio player found; open {} to listen", report.path.display());
        }
        PlaybackOutcome::SavedOnly => {}
        outcome => println!("Playback: {outcome}"),
    }
    Ok(())
}
