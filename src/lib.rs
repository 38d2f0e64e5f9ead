pub mod core;

use std::path::Path;
use std::sync::Arc;

use crate::core::config::{QuakeConfig, ENV_FILE};
use crate::core::feed::fetcher::HttpFeedFetcher;
use crate::core::pipeline::{
    Connectivity, ListPipeline, PipelineState, PresentationSurface, SurfaceMessage,
};
use crate::core::presentation::EarthquakeListViewModel;
use crate::core::AppServices;
use tracing_subscriber::EnvFilter;

pub use crate::core::feed::parser::parse_feed;
pub use crate::core::feed::types::EarthquakeRecord;
pub use crate::core::presentation::PresentationMapper;

/// Prints the list to stdout. Stands in for a real list screen.
#[derive(Debug, Default)]
struct ConsoleSurface {
    shown_rows: usize,
}

impl PresentationSurface for ConsoleSurface {
    fn set_busy(&mut self, busy: bool) {
        if busy {
            tracing::info!("loading earthquakes...");
        }
    }

    fn clear_rows(&mut self) {
        self.shown_rows = 0;
    }

    fn show_rows(&mut self, rows: Vec<EarthquakeListViewModel>) {
        for row in &rows {
            println!(
                "{:>5}  [{} {}]  {}{}",
                row.magnitude_label,
                row.magnitude_tier.color_token(),
                row.magnitude_tier.default_hex(),
                row.location_offset,
                row.location_place
            );
            println!("       {} {}", row.date_label, row.time_label);
            if !row.detail_url.is_empty() {
                println!("       {}", row.detail_url);
            }
            println!();
        }
        self.shown_rows = rows.len();
    }

    fn show_message(&mut self, message: SurfaceMessage) {
        println!("{}", message.default_text());
    }
}

fn connectivity(config: &QuakeConfig) -> Connectivity {
    if config.offline {
        Connectivity::Disconnected
    } else {
        Connectivity::Connected
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn load_once(config: &QuakeConfig) -> anyhow::Result<()> {
    let url = config.resolved_feed_url()?;
    let fetcher = HttpFeedFetcher::new(config.request_timeout)?;
    let mut pipeline = ListPipeline::new(
        Arc::new(fetcher),
        config.mapper(),
        url.clone(),
        ConsoleSurface::default(),
    );

    if pipeline.trigger(connectivity(config)) != PipelineState::Loading {
        return Ok(());
    }
    tracing::info!(%url, "fetching earthquake feed");
    let finished = tokio::select! {
        state = pipeline.complete() => Some(state),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(Some(PipelineState::Loaded)) => {
            tracing::info!(rows = pipeline.surface().shown_rows, "earthquake list ready");
        }
        Some(Some(state)) => tracing::info!(?state, "earthquake load finished"),
        Some(None) => tracing::warn!("earthquake load was cancelled"),
        None => {
            tracing::info!("interrupted, discarding in-flight load");
            pipeline.teardown();
        }
    }
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let config = QuakeConfig::load(Path::new(ENV_FILE))?;
    for (service, status) in AppServices::default().health_report() {
        tracing::debug!(%service, %status, "service status");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(load_once(&config))
}
