//! vgen CLI: converts fragment JSON files into Verilog modules.

#![warn(missing_docs)]

mod convert;

use std::process;

use clap::{Parser, Subcommand};

/// vgen, a fragment to Verilog generator.
#[derive(Parser, Debug)]
#[command(name = "vgen", version, about = "Fragment to Verilog generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `vgen.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a fragment JSON file into a Verilog module.
    Convert(ConvertArgs),
}

/// Arguments for the `vgen convert` subcommand.
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Fragment file in JSON form.
    pub fragment: String,

    /// Output directory for the module and its data files.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the module on stdout instead of writing files.
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,

    /// Module name (default: from the configuration, else `top`).
    #[arg(long)]
    pub name: Option<String>,

    /// Port signals by name, replacing the platform's list.
    #[arg(long, num_args = 1..)]
    pub io: Vec<String>,

    /// Print combinational logic one block per signal.
    #[arg(long)]
    pub debug_comb: bool,

    /// Leave register declarations without reset initializers.
    #[arg(long)]
    pub no_regs_init: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(log_level(cli.quiet, cli.verbose))
        .target(env_logger::Target::Stderr)
        .init();

    let global = GlobalArgs {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Convert(ref args) => convert::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn log_level(quiet: bool, verbose: bool) -> log::LevelFilter {
    match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, true) => log::LevelFilter::Debug,
        (false, false) => log::LevelFilter::Warn,
    }
}
