mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mrt_lib::context::DEFAULT_CONTEXT_DIR;

use crate::cmd::{cmd_build, cmd_create, cmd_export, cmd_generate, cmd_info, cmd_package};
use crate::output::{OutputFormat, print_error};

/// mrt - recipe driver for the metalraytracing package
#[derive(Parser)]
#[command(name = "mrt")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Build context directory owned by this recipe instance
  #[arg(long, global = true, env = "MRT_CONTEXT", default_value = DEFAULT_CONTEXT_DIR)]
  context: PathBuf,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

/// Build settings supplied by the caller.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
  /// TOML profile with a [settings] table
  #[arg(long, env = "MRT_PROFILE")]
  profile: Option<PathBuf>,

  /// Override a setting (os, compiler, build_type, arch)
  #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
  settings: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Copy the exported sources into the build context
  Export {
    /// Directory holding the recipe sources
    #[arg(long, default_value = ".")]
    recipe_dir: PathBuf,
  },

  /// Check the platform and write the CMake toolchain
  Generate {
    #[command(flatten)]
    settings: SettingsArgs,
  },

  /// Configure and compile with CMake
  Build,

  /// Install the build into the package directory
  Package,

  /// Run export, generate, build and package in order
  Create {
    /// Directory holding the recipe sources
    #[arg(long, default_value = ".")]
    recipe_dir: PathBuf,

    #[command(flatten)]
    settings: SettingsArgs,
  },

  /// Show recipe and build context information
  Info,
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Export { recipe_dir } => cmd_export(&cli.context, &recipe_dir, cli.output),
    Commands::Generate { settings } => cmd_generate(&cli.context, &settings, cli.output),
    Commands::Build => cmd_build(&cli.context, cli.output),
    Commands::Package => cmd_package(&cli.context, cli.verbose, cli.output),
    Commands::Create { recipe_dir, settings } => cmd_create(&cli.context, &recipe_dir, &settings, cli.output),
    Commands::Info => cmd_info(&cli.context, cli.output),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
