use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::error::SpecimenError;
use crate::fetcher::{FetchReport, Fetcher, ImageClient};
use crate::metadata::{CleanStats, clean, load_raw, write_canonical};
use crate::store::Layout;
use crate::verify::{verify_images, write_bad_image_report};

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub started_at: String,
    pub save_dir: String,
    pub metadata_path: String,
    pub clean: CleanStats,
    pub fetch: FetchReport,
    pub bad_images: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: ImageClient> {
    fetcher: Fetcher<C>,
}

impl<C: ImageClient> App<C> {
    pub fn new(client: C) -> Self {
        Self {
            fetcher: Fetcher::new(client),
        }
    }

    pub fn run(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, SpecimenError> {
        let started_at = Utc::now().to_rfc3339();
        let layout = Layout::from_path(&config.save_dir)?;
        layout.ensure_images_dir()?;

        sink.event(ProgressEvent {
            message: format!("phase=Clean; reading {}", config.meta_path.display()),
            elapsed: None,
        });
        let started = Instant::now();
        let raw = load_raw(&config.meta_path)?;
        let (records, clean_stats) = clean(raw);
        sink.event(ProgressEvent {
            message: format!(
                "phase=Clean; kept {} of {} rows",
                clean_stats.rows_out, clean_stats.rows_in
            ),
            elapsed: Some(started.elapsed()),
        });

        let fetch = self.fetcher.fetch_missing(
            &records,
            layout.images_dir().as_std_path(),
            layout.failure_log_path().as_std_path(),
            sink,
        )?;

        let metadata_path = layout.metadata_path();
        write_canonical(metadata_path.as_std_path(), &records)?;
        info!(path = %metadata_path, rows = records.len(), "wrote canonical metadata");

        let bad_images = if config.check_quality {
            sink.event(ProgressEvent {
                message: "phase=Verify; checking images".to_string(),
                elapsed: None,
            });
            // Scans the save directory itself, not images/.
            let bad = verify_images(layout.root().as_std_path())?;
            write_bad_image_report(layout.bad_images_path().as_std_path(), &bad)?;
            info!(bad = bad.len(), "verified images");
            Some(bad)
        } else {
            None
        };

        Ok(RunResult {
            started_at,
            save_dir: layout.root().to_string(),
            metadata_path: metadata_path.to_string(),
            clean: clean_stats,
            fetch,
            bad_images,
        })
    }
}
