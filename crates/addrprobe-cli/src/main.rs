//! CLI entry point for the `addrprobe` binary.

use std::env;
use std::ffi::OsString;

use addrprobe_cli::errors::{CliError, EXIT_PASS};
use addrprobe_cli::report::{self, ConsoleSink};
use addrprobe_cli::{config_file, RunOptions};
use addrprobe_core::Testbench;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: addrprobe <command> [options]

Commands:
  run     Write both regions, read them back and report
  config  Print the effective configuration as JSON

Options:
  -c, --config <file>        JSON configuration file (default: reference run)
      --bus <split|unified>  Bus discipline (default: split)
      --addressing <byte|word>
                             Address convention (default: byte on split, word on unified)
      --timing <profile>     immediate, registered, address-first, data-first, slow-response
      --address-bits <n>     Address bits the interconnect decodes (default: 64)
      --watchdog <cycles>    Cycles from first data error to termination (default: 128)
      --quiescent <cycles>   Idle cycles after each unified write (default: 10)
      --step-limit <steps>   Abandon a run after this many steps (run only)
      --corrupt <addr>=<val> Overwrite a word before the checkers run (run only, repeatable)
  -v, --verbose              Print every read sample
      --json                 Print the report as JSON (run only)
  -h, --help                 Show this help message

Exit status: 0 pass, 1 data error, 2 configuration error, 3 step limit, 64 usage.

Examples:
  addrprobe run
  addrprobe run --bus unified --address-bits 32
  addrprobe run --corrupt 0x400000000=0x12345679 --json
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(RunOptions),
    Config(RunOptions),
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, CliError> {
    let first = args
        .next()
        .ok_or_else(|| CliError::Usage("missing command".to_string()))?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();
    let args = args.map(|arg| arg.to_string_lossy().to_string());

    match command_str.as_str() {
        "run" => parse_options(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "config" => parse_options(args)
            .map(Command::Config)
            .map(ParseResult::Command),
        other => Err(CliError::Usage(format!("unknown command: {other}"))),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_options(mut args: impl Iterator<Item = String>) -> Result<RunOptions, CliError> {
    let mut options = RunOptions::default();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(CliError::Usage(USAGE_TEXT.to_string()));
        }
        if !options.apply(&arg, &mut args)? {
            return Err(CliError::Usage(format!("unknown option: {arg}")));
        }
    }

    Ok(options)
}

fn run_config(options: &RunOptions) -> Result<i32, CliError> {
    let config = options.effective_config()?;
    println!("{}", config_file::render(&config)?);
    Ok(EXIT_PASS)
}

fn run_checker(options: &RunOptions) -> Result<i32, CliError> {
    let config = options.effective_config()?;
    let mut bench = Testbench::new(&config)?;
    for corruption in &options.corruptions {
        bench.schedule_corruption(corruption.address, corruption.value);
    }

    let mut sink = ConsoleSink::new(options.json);
    let run = bench.run(options.step_limit, &mut sink)?;

    if options.json {
        println!("{}", report::render_json(&run)?);
    } else {
        println!("{}", report::render_text(&run, config.address_width));
    }
    Ok(report::exit_code(&run))
}

fn main() {
    env_logger::init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            EXIT_PASS
        }
        Ok(ParseResult::Command(command)) => {
            let result = match &command {
                Command::Run(options) => run_checker(options),
                Command::Config(options) => run_config(options),
            };
            result.unwrap_or_else(|error| {
                eprintln!("error: {error}");
                error.exit_code()
            })
        }
        Err(error) => {
            let message = error.to_string();
            if message.starts_with("Usage:") {
                println!("{message}");
                EXIT_PASS
            } else {
                eprintln!("error: {message}");
                eprintln!("{USAGE_TEXT}");
                error.exit_code()
            }
        }
    };

    log::debug!("exiting with status {exit_code}");
    std::process::exit(exit_code);
}
