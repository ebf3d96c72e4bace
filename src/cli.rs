use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pacer", about = "Step counter combining threshold crossings with spectral peak detection")]
pub struct Cli {
    /// Recorded samples to replay (`t,ax,ay,az` or `t,magnitude` per line).
    /// Without it a synthetic walker is simulated.
    pub input: Option<PathBuf>,

    /// Config file (defaults to pacer.toml or the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Samples per analysis window (power of two)
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Acceleration magnitude that counts as a threshold crossing
    #[arg(long)]
    pub acc_threshold: Option<f64>,

    /// Minimum spectral peak magnitude for a frequency-domain estimate
    #[arg(long)]
    pub move_threshold: Option<f64>,

    /// Multiplier applied to replayed readings (e.g. 0.000402 for raw counts)
    #[arg(long)]
    pub scale: Option<f64>,

    /// Synthetic walker sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Synthetic walker cadence in steps per second
    #[arg(long)]
    pub cadence: Option<f64>,

    /// Synthetic run length in seconds (0 = until interrupted)
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Pace the synthetic walker against the wall clock
    #[arg(long)]
    pub realtime: bool,

    /// Redraw the status display every N samples
    #[arg(long)]
    pub refresh: Option<u64>,

    /// Write one JSON line per completed window to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Do not print the status display
    #[arg(short, long)]
    pub quiet: bool,
}
