use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

mod commands;
mod error;

use crate::error::CliResult;

#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(about = "Schema-driven interface compiler for native modules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Project directory (default: search upwards from the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new project with a sample schema
    Init {
        /// Project name
        #[arg(value_name = "NAME")]
        name: String,

        /// tether-rt crate to build against (default: the one this CLI was built with)
        #[arg(long, value_name = "DIR")]
        runtime: Option<PathBuf>,
    },

    /// Generate bindings from the schema files (default)
    Codegen,

    /// Verify bindings are current, then build the implementation crate
    Build {
        /// Build with optimizations
        #[arg(short, long)]
        release: bool,
    },

    /// Print the resolved schema
    Show {
        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Check the toolchain and the project setup
    Doctor,

    /// Remove generated files and build output
    Clean,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .format_timestamp(None)
        .format_target(false)
        .init();

    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let project = cli.project;
    match cli.command.unwrap_or(Command::Codegen) {
        Command::Init { name, runtime } => commands::init::handle_init(project, &name, runtime),
        Command::Codegen => commands::codegen::handle_codegen(project),
        Command::Build { release } => commands::build::handle_build(project, release),
        Command::Show { json } => commands::show::handle_show(project, json),
        Command::Doctor => commands::doctor::handle_doctor(project),
        Command::Clean => commands::clean::handle_clean(project),
    }
}
