pub mod config;
pub mod feed;
pub mod pipeline;
pub mod presentation;

use std::collections::BTreeMap;

use feed::FeedService;
use pipeline::PipelineService;
use presentation::PresentationService;

#[derive(Debug, Clone, Default)]
pub struct AppServices {
    feed: FeedService,
    presentation: PresentationService,
    pipeline: PipelineService,
}

impl AppServices {
    pub fn health_report(&self) -> BTreeMap<String, String> {
        let mut report = BTreeMap::new();
        report.insert(self.feed.name().to_string(), self.feed.status().to_string());
        report.insert(
            self.presentation.name().to_string(),
            self.presentation.status().to_string(),
        );
        report.insert(
            self.pipeline.name().to_string(),
            self.pipeline.status().to_string(),
        );
        report
    }
}
