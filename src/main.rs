mod cli;
mod config;
mod display;
mod dsp;
mod pedometer;
mod sensor;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use cli::Cli;
use config::Config;
use display::report::ReportWriter;
use display::TerminalDisplay;
use pedometer::pipeline::Pedometer;
use sensor::replay::ReplaySource;
use sensor::synthetic::SyntheticSource;
use sensor::SampleSource;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect pacer.toml / user config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("pacer.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("pacer").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("pacer").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            // An explicitly requested file must load; a discovered one may fall back.
            Err(err) if cli.config.is_some() => return Err(err),
            Err(err) => {
                log::warn!("{:#}; using defaults", err);
                Config::default()
            }
        },
        None => Config::default(),
    };
    apply_overrides(&mut cfg, &cli);

    let mut pedometer = Pedometer::new(&cfg).context("Invalid configuration")?;

    log::info!("pacer - dual-estimator step counter");
    log::info!(
        "Window: {} samples, thresholds: acc={:.2} move={:.1}",
        cfg.window.size,
        cfg.thresholds.acceleration,
        cfg.thresholds.movement
    );

    let mut source: Box<dyn SampleSource> = match cli.input {
        Some(ref path) => Box::new(ReplaySource::open(path, cfg.source.scale)?),
        None => {
            log::info!(
                "Simulating walker: {:.2} steps/s at {:.0}Hz for {}",
                cfg.source.cadence,
                cfg.source.sample_rate,
                if cfg.source.duration > 0.0 {
                    format!("{:.1}s", cfg.source.duration)
                } else {
                    "ever".to_string()
                }
            );
            let walker = SyntheticSource::new(&cfg.source);
            if cli.realtime {
                Box::new(walker.realtime())
            } else {
                Box::new(walker)
            }
        }
    };

    let mut display: TerminalDisplay<Box<dyn Write>> = if cli.quiet {
        TerminalDisplay::new(Box::new(std::io::sink()))
    } else {
        TerminalDisplay::new(Box::new(std::io::stdout().lock()))
    };

    let mut report = match cli.report {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create report: {}", path.display()))?;
            log::info!("Writing window reports to {}", path.display());
            Some(ReportWriter::new(BufWriter::new(file)))
        }
        None => None,
    };

    let summary = pedometer.run(source.as_mut(), &mut display, |outcome| match report {
        Some(ref mut writer) => writer.write(outcome),
        None => Ok(()),
    })?;

    log::info!(
        "Done: {} steps over {} windows ({} samples, {:.1}s)",
        summary.steps,
        summary.windows,
        summary.ticks,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

/// CLI flags take precedence over config file values.
fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(size) = cli.window {
        cfg.window.size = size;
    }
    if let Some(acc) = cli.acc_threshold {
        cfg.thresholds.acceleration = acc;
    }
    if let Some(movement) = cli.move_threshold {
        cfg.thresholds.movement = movement;
    }
    if let Some(scale) = cli.scale {
        cfg.source.scale = scale;
    }
    if let Some(rate) = cli.sample_rate {
        cfg.source.sample_rate = rate;
    }
    if let Some(cadence) = cli.cadence {
        cfg.source.cadence = cadence;
    }
    if let Some(duration) = cli.duration {
        cfg.source.duration = duration;
    }
    if let Some(refresh) = cli.refresh {
        cfg.display.refresh_ticks = refresh;
    }
}
