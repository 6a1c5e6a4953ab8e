use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod backend;
mod config;
mod desktop;
mod ui;
mod utils;

use backend::{mp3_filename, mp4_filename, Backend, BackendClient, Links};
use config::Config;
use desktop::{Desktop, SystemDesktop};
use ui::{Controller, Shell};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Backend base URL, overrides the config file and BACKEND_BASE
    #[arg(short, long)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive page (default)
    Shell,
    /// Look up a URL and print its formats and subtitles
    Info { url: String },
    /// Print caption tracks for a URL
    Captions { url: String },
    /// Check that the backend is up
    Health,
    /// Build the server-side MP4 merge link for a URL
    GrabMp4 {
        url: String,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        title: Option<String>,
        /// Open the link instead of printing it
        #[arg(long)]
        open: bool,
    },
    /// Build the server-side MP3 extraction link for a URL
    GrabMp3 {
        url: String,
        #[arg(long)]
        title: Option<String>,
        /// Open the link instead of printing it
        #[arg(long)]
        open: bool,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match config::get_config_path(args.config.as_deref()) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };
    config.with_overrides(args.backend.as_deref())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn open_or_print(desktop: &SystemDesktop, link: &str, open: bool) -> Result<()> {
    if open {
        desktop.open_url(link).await?;
    }
    println!("{}", link);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config);

    info!("Starting pksyou against {}", config.backend_base);

    let links = Links::new(&config.backend_base)?;
    let client = Arc::new(BackendClient::new(links.clone(), config.request_timeout())?);
    let desktop = Arc::new(SystemDesktop::new(&config.desktop));

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            if !desktop.test_availability().await {
                info!("Desktop integration is incomplete; copy/open may be ignored");
            }
            let controller = Arc::new(Controller::new(
                client,
                desktop,
                links,
                config.merge.default_height,
            ));
            Shell::new(controller).run().await?;
        }
        Command::Info { url } => {
            let controller =
                Controller::new(client, desktop, links, config.merge.default_height);
            controller.set_url_input(&url);
            controller.fetch_info(&url).await;

            let page = controller.snapshot();
            for line in [&page.title, &page.meta, &page.note] {
                if !line.is_empty() {
                    println!("{}", line);
                }
            }
            print!("{}", ui::render_lists(&page));
        }
        Command::Captions { url } => {
            let subtitles = client.captions(&url).await?;
            for subtitle in &subtitles {
                println!(
                    "{}\t.{}\t{}",
                    subtitle.lang(),
                    subtitle.ext(),
                    subtitle.direct_url().unwrap_or("-")
                );
            }
            info!("{} caption tracks", subtitles.len());
        }
        Command::Health => {
            let health = client.health().await?;
            if !health.ok {
                anyhow::bail!("Backend at {} reports unhealthy", links.base());
            }
            println!("✅ {} {} at {}", health.app, health.version, links.base());
        }
        Command::GrabMp4 {
            url,
            height,
            title,
            open,
        } => {
            let height = height.unwrap_or(config.merge.default_height);
            if !config::QUALITY_HEIGHTS.contains(&height) {
                anyhow::bail!(
                    "Unsupported height {} (choose one of {:?})",
                    height,
                    config::QUALITY_HEIGHTS
                );
            }
            let link = links.grab_mp4(&url, height, &mp4_filename(title.as_deref()));
            open_or_print(&desktop, link.as_str(), open).await?;
        }
        Command::GrabMp3 { url, title, open } => {
            let link = links.grab_mp3(&url, &mp3_filename(title.as_deref()));
            open_or_print(&desktop, link.as_str(), open).await?;
        }
    }

    Ok(())
}
