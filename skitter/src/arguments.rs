use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Frontier configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// File with seed URLs, one per line.
    #[arg(short, long)]
    pub seeds: PathBuf,

    /// Drain the frontier newest-first instead of oldest-first.
    #[arg(long)]
    pub lifo: bool,

    /// Suppress log output.
    #[arg(short, long)]
    pub quiet: bool,
}
