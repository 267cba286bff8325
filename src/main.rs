mod build;
mod checksum;
mod config;
mod github;
mod http;
mod logger;
mod wizard;

use anyhow::{Context, Result};
use build::{form::Form, interrupt::Interrupts, BuildParameters, Execution};
use clap::{Parser, Subcommand};
use config::{BuildConfig, Config};
use github::ReleaseScraper;
use std::{
    io::{stdin, stdout},
    path::{Path, PathBuf},
};
use wizard::{
    actions::{ActionContext, KnownFolder, SystemDesktop},
    catalog,
    terminal::{Exit, Terminal},
};

#[derive(Parser)]
#[command(name = "nooksmith")]
#[command(about = "Packages StreamNook and sets up the applications it relies on")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file, defaults to ./nooksmith.yaml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More output, repeat for trace logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Package the application into a single executable with PyInstaller
    Build {
        /// Use the configured parameters without prompting
        #[arg(long)]
        non_interactive: bool,
        /// Version to embed, x.y.z or x.y.z.w
        #[arg(long)]
        version: Option<String>,
        /// Directory containing UPX
        #[arg(long)]
        upx_dir: Option<PathBuf>,
    },
    /// Walk through installing the player, Streamlink, Chatterino and the plugin
    Setup {
        /// Where downloads are saved
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose)?;

    let config = Config::load(cli.config.as_deref())
        .await
        .context("Cannot load config file")?;

    match cli.command {
        Commands::Build {
            non_interactive,
            version,
            upx_dir,
        } => {
            let build_config = config.build.with_overrides(version, upx_dir);

            let work_dir = std::env::current_dir().context("Cannot read the working directory")?;

            if non_interactive {
                build::build(&build_config.parameters, &build_config, &work_dir, Execution::Blocking)
                    .await
                    .context("Build failed")?;
            } else {
                build_interactively(&build_config, &work_dir).await;
            }
        }
        Commands::Setup { download_dir } => {
            let download_dir = match download_dir.or(config.setup.download_dir.clone()) {
                Some(dir) => dir,
                None => KnownFolder::Downloads.path()?,
            };

            let resolver = ReleaseScraper::new(config.setup.github_url.as_str())
                .context("Cannot create the HTTP client")?;
            let context = ActionContext::new(
                resolver,
                SystemDesktop,
                config.setup.assets.clone(),
                download_dir,
            );

            let exit = Terminal::new(stdin().lock(), stdout())
                .run(&catalog::catalog(&config.setup), &context)
                .await?;

            if exit == Exit::Quit {
                log::info!("Setup left before the last step");
            }
        }
    }

    Ok(())
}

/// Failures are reported and the form offered again, so this never errors.
/// Ctrl-C cancels a running build and ends the session at a prompt.
async fn build_interactively(config: &BuildConfig, work_dir: &Path) {
    let interrupts = Interrupts::install();
    let mut form = Form::new(stdin().lock(), stdout());
    let mut params: BuildParameters = config.parameters.clone();

    loop {
        params = match form.fill(&params) {
            Ok(params) => params,
            Err(err) => {
                log::error!("Cannot read the build parameters: {:#}", err);
                return;
            }
        };

        match build::build(&params, config, work_dir, Execution::Background(&interrupts)).await {
            Ok(_) => {
                log::info!("Build finished");
                return;
            }
            Err(err) => log::error!("Build failed: {:#}", err),
        }

        match form.confirm("Edit the parameters and retry?") {
            Ok(true) => {}
            _ => return,
        }
    }
}
