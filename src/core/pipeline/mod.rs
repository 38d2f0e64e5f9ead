use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::core::feed::fetcher::{FeedSource, FetchError, FetchStatus};
use crate::core::feed::parser::parse_feed_with_summary;
use crate::core::feed::types::EarthquakeRecord;
use crate::core::presentation::{EarthquakeListViewModel, PresentationMapper};

#[derive(Debug, Clone, Default)]
pub struct PipelineService;

impl PipelineService {
    pub fn name(&self) -> &'static str {
        "pipeline"
    }

    pub fn status(&self) -> &'static str {
        "ready"
    }
}

/// Reported by the host's connectivity check when a load is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum EmptyReason {
    NoEarthquakes,
    NotConnected,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Loaded,
    Empty(EmptyReason),
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SurfaceMessage {
    NoEarthquakes,
    NotConnected,
    LoadFailed,
}

impl SurfaceMessage {
    pub fn default_text(&self) -> &'static str {
        match self {
            Self::NoEarthquakes => "No earthquakes found.",
            Self::NotConnected => "No internet connection.",
            Self::LoadFailed => "Earthquake data could not be loaded.",
        }
    }
}

/// The list screen the pipeline drives. Calls only ever come from the task
/// that owns the pipeline.
pub trait PresentationSurface {
    fn set_busy(&mut self, busy: bool);
    fn clear_rows(&mut self);
    fn show_rows(&mut self, rows: Vec<EarthquakeListViewModel>);
    fn show_message(&mut self, message: SurfaceMessage);
}

/// The host's "open this URL" capability.
pub trait LinkOpener {
    fn open(&self, url: &str);
}

enum LoadOutcome {
    Loaded {
        records: Vec<EarthquakeRecord>,
        rows: Vec<EarthquakeListViewModel>,
    },
    Failed(FetchError),
}

/// Loads the feed off the surface's task and applies the result back on it.
///
/// At most one load is in flight: triggering again aborts the previous one.
/// Dropping or tearing down the pipeline aborts the in-flight load, and since
/// the pipeline owns the surface nothing can reach it afterwards.
pub struct ListPipeline<S: PresentationSurface> {
    source: Arc<dyn FeedSource>,
    mapper: Arc<PresentationMapper>,
    url: String,
    surface: S,
    state: PipelineState,
    records: Vec<EarthquakeRecord>,
    in_flight: Option<JoinHandle<LoadOutcome>>,
}

impl<S: PresentationSurface> ListPipeline<S> {
    pub fn new(
        source: Arc<dyn FeedSource>,
        mapper: PresentationMapper,
        url: impl Into<String>,
        surface: S,
    ) -> Self {
        Self {
            source,
            mapper: Arc::new(mapper),
            url: url.into(),
            surface,
            state: PipelineState::Idle,
            records: Vec::new(),
            in_flight: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn records(&self) -> &[EarthquakeRecord] {
        &self.records
    }

    /// Starts a load, or goes straight to the not-connected empty state.
    /// Must be called inside a tokio runtime.
    pub fn trigger(&mut self, connectivity: Connectivity) -> PipelineState {
        self.cancel_in_flight();
        self.records.clear();

        if connectivity == Connectivity::Disconnected {
            tracing::info!("not connected, skipping earthquake load");
            self.surface.set_busy(false);
            self.surface.clear_rows();
            self.surface.show_message(SurfaceMessage::NotConnected);
            self.state = PipelineState::Empty(EmptyReason::NotConnected);
            return self.state;
        }

        self.surface.clear_rows();
        self.surface.set_busy(true);
        self.state = PipelineState::Loading;

        let source = Arc::clone(&self.source);
        let mapper = Arc::clone(&self.mapper);
        let url = self.url.clone();
        self.in_flight = Some(tokio::spawn(load(source, mapper, url)));
        self.state
    }

    /// Waits for the in-flight load and applies it to the surface.
    ///
    /// Returns `None` when nothing is loading or the load was aborted. Safe to
    /// cancel: dropping this future leaves the load in flight.
    pub async fn complete(&mut self) -> Option<PipelineState> {
        let handle = self.in_flight.as_mut()?;
        let joined = handle.await;
        self.in_flight = None;

        match joined {
            Ok(outcome) => Some(self.apply(outcome)),
            Err(error) if error.is_cancelled() => None,
            Err(error) => {
                tracing::error!(%error, "earthquake load task panicked");
                Some(self.apply_failure())
            }
        }
    }

    /// Hands the detail URL of the row at `index` to the opener. Rows without
    /// a URL do nothing.
    pub fn select(&self, index: usize, opener: &dyn LinkOpener) -> bool {
        match self.records.get(index) {
            Some(record) if !record.detail_url().is_empty() => {
                opener.open(record.detail_url());
                true
            }
            _ => false,
        }
    }

    pub fn teardown(mut self) {
        self.cancel_in_flight();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            tracing::debug!("aborting in-flight earthquake load");
            handle.abort();
        }
    }

    fn apply(&mut self, outcome: LoadOutcome) -> PipelineState {
        match outcome {
            LoadOutcome::Loaded { records, rows } if !rows.is_empty() => {
                self.surface.set_busy(false);
                self.records = records;
                self.surface.show_rows(rows);
                self.state = PipelineState::Loaded;
            }
            LoadOutcome::Loaded { .. } => {
                self.surface.set_busy(false);
                self.surface.show_message(SurfaceMessage::NoEarthquakes);
                self.state = PipelineState::Empty(EmptyReason::NoEarthquakes);
            }
            LoadOutcome::Failed(error) => {
                tracing::warn!(%error, kind = ?error.kind(), "earthquake load failed");
                return self.apply_failure();
            }
        }
        self.state
    }

    fn apply_failure(&mut self) -> PipelineState {
        self.surface.set_busy(false);
        self.surface.show_message(SurfaceMessage::LoadFailed);
        self.state = PipelineState::Failed;
        self.state
    }
}

impl<S: PresentationSurface> Drop for ListPipeline<S> {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

async fn load(
    source: Arc<dyn FeedSource>,
    mapper: Arc<PresentationMapper>,
    url: String,
) -> LoadOutcome {
    match source.fetch(&url).await {
        Ok(FetchStatus::Fetched(feed)) => {
            if !feed.declares_json() {
                tracing::warn!(
                    content_type = feed.content_type.as_deref().unwrap_or_default(),
                    "feed response is not declared as json"
                );
            }
            let (records, summary) = parse_feed_with_summary(&feed.body);
            tracing::info!(
                decoded = summary.decoded,
                skipped = summary.skipped,
                "earthquake feed parsed"
            );
            let rows = mapper.to_view_models(&records);
            LoadOutcome::Loaded { records, rows }
        }
        Ok(FetchStatus::Skipped) => LoadOutcome::Loaded {
            records: Vec::new(),
            rows: Vec::new(),
        },
        Err(error) => LoadOutcome::Failed(error),
    }
}
