//! # numahud - Main Entry Point
//!
//! Supports two operational modes:
//! - **Live TUI** (default): interactive navigation with live counters
//! - **Headless** (`--script KEYS`): run a key sequence and print one line
//!   per transition, for CI and reproducing navigation problems
//!
//! `--simulate` swaps the perf engine for in-memory counters in either mode.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;

use numahud::cli::Args;
use numahud::command::parse_script;
use numahud::counters::{online_cpus, CounterControl, PerfConfig, PerfCounters, SimulatedCounters};
use numahud::preflight::run_preflight_checks;
use numahud::session::Session;
use numahud::tui;
use numahud::views::ProcFs;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    let args = Args::parse();
    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") || msg.contains("requires root") {
        EXIT_NOPERM
    } else if msg.contains("invalid key") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// `RUST_LOG` picks the level; `--log-file` keeps log lines off the TUI
fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = &args.log_file {
        let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    init_logging(args)?;

    if args.simulate {
        info!("Using simulated counters");
        return run_session(args, SimulatedCounters::new());
    }

    run_preflight_checks(args.quiet)?;
    let cpus = online_cpus()?;
    let config = PerfConfig { latency_threshold: args.ll_threshold, ..PerfConfig::default() };
    info!("Opening counters on {} CPUs", cpus.len());
    run_session(args, PerfCounters::new(cpus, config))
}

fn run_session<C: CounterControl>(args: &Args, counters: C) -> Result<()> {
    // Validate the script before touching any counter
    let keys = args
        .script
        .as_deref()
        .map(parse_script)
        .transpose()
        .map_err(|name| anyhow::anyhow!("Invalid key <{name}> in --script"))?;

    let mut session = Session::new(counters, Box::new(ProcFs::default()));
    session.start().context("Failed to start profiling")?;

    let result = match keys {
        Some(keys) => {
            for key in keys {
                let before = session.journal().next_seq();
                session.press(key);
                // Rows must be present before the next key can select one
                session.tick();
                if !args.quiet {
                    for record in session.journal().since(before) {
                        println!("{record}");
                    }
                }
                if session.should_quit() {
                    break;
                }
            }
            Ok(())
        }
        None => tui::run_live(&mut session, Duration::from_secs(args.interval)),
    };

    session.shutdown();

    if let Some(path) = &args.dump {
        let file = File::create(path).context("Failed to create journal file")?;
        session.journal().export(BufWriter::new(file)).context("Failed to export journal")?;
        if !args.quiet {
            println!("journal: {} ({} transitions)", path.display(), session.journal().len());
        }
    }

    result
}
