// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "astroview")]
#[command(about = "Async render-loop view controller demo", long_about = None)]
pub struct Cli {
    /// Disable multisample antialiasing
    #[arg(long = "no-msaa", default_value = "false")]
    pub no_msaa: bool,

    /// Preferred display-link rate in frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Path to a JSON view configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
