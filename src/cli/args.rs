//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Rebuild a LaTeX document whenever its sources change
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root (sources live in `<ROOT>/src`)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub root: PathBuf,

    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: texbuild.toml in ROOT)
    #[arg(short = 'C', long, global = true, default_value = "texbuild.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sync, compile and publish the document once
    #[command(visible_alias = "build")]
    Once {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then rebuild on every change under `src/`
    #[command(visible_alias = "watch")]
    Loop {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Quiet window before a burst of changes triggers a build
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,
    },

    /// Mirror `src/` into `bld/` without compiling
    Copy {
        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },

    /// Remove `bld/` and `dst/`
    Clean,

    /// Create the project root and its `src/` directory
    Init,
}

/// Shared arguments for Once and Loop commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Main document in `src/` (with or without `.tex`)
    pub document: String,

    /// Name of the published file in `dst/` (default: document name)
    #[arg(short, long)]
    pub output_name: Option<String>,

    /// Extra options appended to the compiler command line
    #[arg(long = "opts", value_name = "OPT", num_args = 1.., allow_hyphen_values = true)]
    pub opts: Vec<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init)
    }

    pub const fn is_clean(&self) -> bool {
        matches!(self.command, Commands::Clean)
    }

    /// Arguments of the commands that compile.
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Once { build_args } | Commands::Loop { build_args, .. } => Some(build_args),
            _ => None,
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Copy { verbose } => *verbose,
            _ => self.build_args().is_some_and(|args| args.verbose),
        }
    }

    pub fn debounce_ms(&self) -> Option<u64> {
        match &self.command {
            Commands::Loop { debounce_ms, .. } => *debounce_ms,
            _ => None,
        }
    }
}
