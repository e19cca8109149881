use anyhow::{Result, anyhow};
use log::warn;
use pico_args::Arguments;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::{
    env, io,
    path::PathBuf,
    sync::{Arc, atomic::AtomicBool},
};

use crate::actions::{self, JsonLinesSink};
use crate::config::{self, Settings};
use crate::input::{self, ScriptedSource};
use crate::scheduler::{self, DualTaskScheduler, RunReport};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    let subcmd: Option<String> = pargs.subcommand()?;

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.opt_free_from_str()?;
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("run") => {
            let input: String = pargs
                .value_from_str("--input")
                .map_err(|_| anyhow!("usage: irpoint run --input <path|-> --output <path|-|uinput>"))?;
            let output: String = pargs
                .value_from_str("--output")
                .map_err(|_| anyhow!("usage: irpoint run --input <path|-> --output <path|-|uinput>"))?;
            warn_unused(pargs);

            let settings = Arc::new(config::resolve(config_path.as_deref())?);
            let source = input::open_source(&input)?;
            let sink = actions::open_sink(&output)?;

            let stop = Arc::new(AtomicBool::new(false));
            register_stop_signals(&[SIGINT, SIGTERM], &stop)?;

            let report = DualTaskScheduler::new(settings, source, sink).run(stop)?;
            print_report(&report);
            Ok(())
        }

        Some("replay") => {
            let input: String = pargs
                .value_from_str("--input")
                .map_err(|_| anyhow!("usage: irpoint replay --input <path|->"))?;
            warn_unused(pargs);

            let settings = config::resolve(config_path.as_deref())?;
            // Read the whole capture up front so a bad file fails before any output.
            let samples = input::read_all(input::open_source(&input)?.as_mut())?;
            let source = Box::new(ScriptedSource::new(samples));
            let sink = Box::new(JsonLinesSink::new(io::stdout()));
            let report = scheduler::replay(&settings, source, sink)?;
            print_report(&report);
            Ok(())
        }

        Some("config") => {
            warn_unused(pargs);
            let settings: Settings = config::resolve(config_path.as_deref())?;
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

/// The first signal raises `stop` and the tasks wind down after their
/// current tick. A poll blocked on a silent input never sees the flag, so
/// a second signal exits the process at once.
fn register_stop_signals(signals: &[i32], stop: &Arc<AtomicBool>) -> Result<()> {
    for &sig in signals {
        // Order matters: the shutdown check must see the flag before it is set.
        signal_hook::flag::register_conditional_shutdown(sig, 1, Arc::clone(stop))?;
        signal_hook::flag::register(sig, Arc::clone(stop))?;
    }
    Ok(())
}

fn warn_unused(pargs: Arguments) {
    let rest = pargs.finish();
    if !rest.is_empty() {
        warn!("ignoring unused arguments: {rest:?}");
    }
}

fn print_report(report: &RunReport) {
    // Reports go to stderr so stdout stays a clean frame stream.
    eprintln!(
        "{}",
        serde_json::to_string_pretty(report).unwrap_or_default()
    );
}

fn print_help() {
    println!(
        r#"irpoint — IR blob tracker to relative pointer frames

USAGE:
  irpoint help [command]                          Show general or command-specific help
  irpoint run --input <src> --output <dst>        Run the poll and output tasks on a clock
  irpoint replay --input <src>                    Replay a capture, print frames as JSON lines
  irpoint config                                  Print the effective settings

OPTIONS:
  --config <path>    Settings file (default: ~/.config/irpoint/config.toml)

SOURCES:   a capture of 16-byte sensor records, or '-' for stdin
SINKS:     a path (e.g. /dev/ttyUSB0), '-' for stdout, or 'uinput'

TIPS:
  - RUST_LOG=debug shows tap decisions, RUST_LOG=trace every decoded point
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: irpoint run --input <path|-> --output <path|-|uinput> [--config <path>]\n\
             Polls the input every poll period and emits one 9-byte frame every output period.\n\
             Stops at end of input or on SIGINT/SIGTERM; a second signal exits at once,\n\
             which is needed when the input is blocked waiting for data."
        ),
        "replay" => println!(
            "usage: irpoint replay --input <path|-> [--config <path>]\n\
             Runs the pipeline without a clock and prints each frame as a JSON line."
        ),
        "config" => println!(
            "usage: irpoint config [--config <path>]\n\
             Prints the settings in effect, installing the defaults if none exist."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
