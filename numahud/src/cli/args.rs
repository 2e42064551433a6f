//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "numahud",
    about = "Monitor NUMA memory access and latency with hardware counters",
    after_help = "\
EXAMPLES:
    sudo numahud                             Live TUI on the whole system
    numahud --simulate                       Try the UI without hardware counters
    numahud --simulate --script '<enter>lq'  Run keys headless and print transitions
    sudo numahud --dump journal.json         Write the transition journal on exit"
)]
pub struct Args {
    /// Use simulated counters instead of perf events
    #[arg(long)]
    pub simulate: bool,

    /// Seconds between refreshes of the current view
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Load-latency threshold in core cycles for low-latency sampling
    #[arg(long, default_value = "128", value_name = "CYCLES")]
    pub ll_threshold: u64,

    /// Write the transition journal as JSON on exit
    #[arg(long, value_name = "FILE")]
    pub dump: Option<PathBuf>,

    /// Run these keys without TUI, e.g. '<enter>c2<esc>q'
    #[arg(long, value_name = "KEYS")]
    pub script: Option<String>,

    /// Write log output to FILE (the TUI owns the terminal)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["numahud"]).unwrap();
        assert!(!args.simulate);
        assert_eq!(args.interval, 2);
        assert_eq!(args.ll_threshold, 128);
        assert!(args.script.is_none());
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Args::try_parse_from(["numahud", "--interval", "0"]).is_err());
    }

    #[test]
    fn test_script_and_dump() {
        let args =
            Args::try_parse_from(["numahud", "--simulate", "--script", "<enter>q", "--dump", "j.json"])
                .unwrap();
        assert_eq!(args.script.as_deref(), Some("<enter>q"));
        assert_eq!(args.dump, Some(PathBuf::from("j.json")));
    }
}
