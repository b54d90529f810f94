//! gitmirror CLI - migrate git repositories between hosting providers

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gitmirror_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ForkArgs, MigrateArgs};

/// gitmirror: fork or mirror a git repository to another location
#[derive(Parser, Debug)]
#[command(name = "gitmirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base directory for working clones (overrides config and env)
    #[arg(long, global = true, env = "GITMIRROR_WORK_DIR")]
    work_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Fork when both ends share a provider, mirror-push otherwise
    #[command(visible_alias = "m")]
    Migrate(MigrateArgs),

    /// Mirror-clone the source and force-push every branch and tag
    Mirror(MigrateArgs),

    /// Fork a repository on its hosting provider
    Fork(ForkArgs),

    /// Show current configuration
    Config,

    /// Create a secrets template at the default location
    InitSecrets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load_with_overrides(cli.work_dir.clone())?;

    if cli.verbose {
        tracing::debug!(
            work_dir = ?config.mirror.work_dir,
            github_domain = %config.github.domain,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("gitmirror {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Migrate(args)) => {
            let secrets = Secrets::load()?;
            args.execute(&config, &secrets, false).await?;
        }
        Some(Commands::Mirror(args)) => {
            let secrets = Secrets::load()?;
            args.execute(&config, &secrets, true).await?;
        }
        Some(Commands::Fork(args)) => {
            let secrets = Secrets::load()?;
            args.execute(&config, &secrets).await?;
        }
        Some(Commands::Config) => {
            println!("gitmirror Configuration");
            println!("=======================");
            println!();
            println!("Mirror Settings:");
            println!(
                "  work_dir: {}",
                config
                    .mirror
                    .work_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(current directory)".to_string())
            );
            println!("  remote_name: {}", config.mirror.remote_name);
            println!(
                "  delete_created_on_push_failure: {}",
                config.mirror.delete_created_on_push_failure
            );
            println!();
            println!("GitHub Settings:");
            println!("  domain: {}", config.github.domain);
            println!(
                "  api_url: {}",
                config.github.api_url.as_deref().unwrap_or("(default)")
            );
            println!(
                "  strict_existence_check: {}",
                config.github.strict_existence_check
            );
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        Some(Commands::InitSecrets) => {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
        }
        None => {
            println!("gitmirror - fork or mirror git repositories between hosting providers");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
