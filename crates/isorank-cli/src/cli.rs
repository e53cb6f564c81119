use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "isorank developers",
    version,
    about = "isorank - Aggregate quantum-chemistry cluster searches by composition and rank isomers by total energy.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank isomers per composition and write summary tables and structures.
    Process(ProcessArgs),
    /// List the compositions found in the inputs without writing any file.
    Inspect(InspectArgs),
}

/// Arguments shared by every command that reads result archives.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Result archives, or directories scanned recursively for them.
    #[arg(short, long = "input", required = true, num_args(1..), value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub elements: ElementArgs,

    /// File-name glob used when scanning directories (default: '*.json').
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Drop jobs whose HOMO-LUMO gap is missing or not finite.
    #[arg(long)]
    pub skip_nan_gap: bool,

    /// Set a specific configuration value, overriding the config file and other flags.
    /// Can be used multiple times. Example: -S selection.isomers=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// The tracked elements, given either as symbols or as atomic numbers.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct ElementArgs {
    /// Element symbols in column order (e.g., 'C,H').
    #[arg(short = 'e', long = "elements", value_delimiter = ',', value_name = "SYMBOLS")]
    pub symbols: Vec<String>,

    /// Atomic numbers in column order (e.g., '6,1').
    #[arg(short = 'z', long = "atomic-numbers", value_delimiter = ',', value_name = "NUMBERS")]
    pub numbers: Vec<u8>,
}

/// Arguments for the `process` subcommand.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub input: InputArgs,

    // --- Output Overrides ---
    /// Directory receiving tables and structure files (created if missing).
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of lowest-energy isomers selected per composition.
    #[arg(short = 'n', long, value_name = "INT")]
    pub isomers: Option<usize>,

    /// Write every selected isomer to '<job>_g<rank>.xyz'.
    #[arg(long)]
    pub write_xyz: bool,

    /// Do not append parsed jobs to '<archive>_res_POSCARS'.
    #[arg(long)]
    pub no_poscars: bool,

    /// Vacuum padding in Angstroms added to each POSCAR box edge.
    #[arg(long, value_name = "FLOAT")]
    pub vacuum: Option<f64>,

    /// TOML file with the first fully-connected isomer rank per composition
    /// ('offsets = [[...], ...]'). Binary systems only.
    #[arg(long, value_name = "PATH")]
    pub connectivity_map: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}
