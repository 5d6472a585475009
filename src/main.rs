use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{debug, error};

use videonamer::config::{Config, LinkTarget};
use videonamer::console::Console;
use videonamer::error::ResolveError;
use videonamer::providers::HttpProviders;
use videonamer::resolver::{Resolver, ResolverOptions};
use videonamer::tracker::JsonTracker;

const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "videonamer",
    version,
    about = "Link video files under readable names confirmed against TMDb and TheTVDB"
)]
struct Cli {
    /// Video file or directory to process
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Config file (default: <config dir>/videonamer/config.toml)
    #[arg(long, env = "VIDEONAMER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the links are created in
    #[arg(long, env = "VIDEONAMER_LINKS_DIR")]
    links_dir: Option<PathBuf>,

    /// TMDb API key, used for movies
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,

    /// TheTVDB API key, used for TV shows
    #[arg(long, env = "TVDB_API_KEY", hide_env_values = true)]
    tvdb_api_key: Option<String>,

    /// Point links at the containing directory instead of the matched file
    #[arg(long)]
    link_directory: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = install_interrupt_handler() {
        debug!(error = %err, "interrupt handler unavailable");
    }

    match run(cli) {
        Ok(()) => {
            println!("All the things done successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<ResolveError>() {
                Some(resolve_err) => eprintln!("{resolve_err}"),
                None => {
                    error!("{err:#}");
                    eprintln!("{err:#}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(links_dir) = cli.links_dir {
        config.links_dir = links_dir;
    }
    if cli.tmdb_api_key.is_some() {
        config.tmdb_api_key = cli.tmdb_api_key;
    }
    if cli.tvdb_api_key.is_some() {
        config.tvdb_api_key = cli.tvdb_api_key;
    }
    if cli.link_directory {
        config.link_target = LinkTarget::Directory;
    }
    debug!(
        links_dir = %config.links_dir.display(),
        link_target = ?config.link_target,
        "configuration resolved"
    );

    if !cli.file.exists() {
        return Err(ResolveError::InvalidPath(cli.file).into());
    }
    fs::create_dir_all(&config.links_dir)
        .with_context(|| format!("Failed to create links directory {}", config.links_dir.display()))?;

    let mut resolver = Resolver::new(
        Console::stdio(),
        Box::new(HttpProviders::new(config.provider_settings())),
        Box::new(JsonTracker::new(config.tracking_file.clone())),
        ResolverOptions {
            links_dir: config.links_dir.clone(),
            link_target: config.link_target,
        },
    )?;

    let summary = resolver.run(&cli.file)?;
    debug!(linked = summary.linked.len(), "run finished");
    Ok(())
}

/// Initialize logging to stderr; `RUST_LOG` overrides the verbosity flag
fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("videonamer={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .with(filter)
        .init();
}

/// Ctrl-C ends the run with the dedicated status, even while blocked on a prompt
fn install_interrupt_handler() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal runtime")?;

    std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nInterrupted by user");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            });
        })
        .context("Failed to spawn interrupt thread")?;
    Ok(())
}
