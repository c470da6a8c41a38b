use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_player::{
    config::Config,
    player::{HeadlessMediaElement, MediaElement, PlayerController, PlayerServices},
    utils::{HttpResourceFetcher, UrlUtils},
};

#[derive(Parser)]
#[command(name = "m3u-player")]
#[command(version)]
#[command(about = "Resolve an M3U playlist and walk through its tracks headlessly")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Page the player is embedded in (overrides config file)
    #[arg(short, long, value_name = "URL")]
    page_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Number of tracks to walk through after loading the first one
    #[arg(short, long, default_value_t = 0)]
    tracks: usize,

    /// Playlist link, absolute or relative to the page
    playlist: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("m3u_player={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting M3U Player v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(Some(&cli.config))?;
    if let Some(page_url) = cli.page_url {
        config.page.url = page_url;
        config.validate()?;
    }
    info!("Embedding page: {}", config.page.url);

    let client = Arc::new(HttpResourceFetcher::from_config(&config.http)?);
    let services = PlayerServices::from_config(&config, client)?;

    let media = Arc::new(HeadlessMediaElement::new(&cli.playlist));
    let controller = PlayerController::attach(media.clone(), services.clone())
        .with_context(|| format!("{} is not a playlist link", cli.playlist))?;

    controller.initialize().await?;

    if let Some(playlist) = controller.playlist().await {
        for (i, entry) in playlist.iter().enumerate() {
            let marker = if entry.is_nested_playlist() { " (playlist)" } else { "" };
            println!("{:>4}  {}{}", i + 1, UrlUtils::obfuscate_credentials(entry.as_str()), marker);
        }
    }

    for _ in 0..cli.tracks {
        media.finish_track(1.0);
        if !controller.on_ended().await {
            warn!("Reached the end of the playlist");
            break;
        }
        println!("Now playing: {}", media.title());
    }

    controller.settle().await;
    info!(
        "Stopped on track {} ({} prefetched, {} object URLs alive)",
        controller.track_index() + 1,
        services.prefetch_cache().len().await,
        services.object_urls().live_count()
    );
    info!("Final source: {}", UrlUtils::obfuscate_credentials(&media.src()));

    Ok(())
}
