use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::error::SpecimenError;
use crate::metadata::SpecimenRecord;
use crate::store::{append_line, existing_image_ids, image_file_name, write_bytes_atomic};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub trait ImageClient: Send + Sync {
    fn download(&self, url: &str) -> Result<Vec<u8>, SpecimenError>;
}

#[derive(Clone)]
pub struct HttpImageClient {
    client: Client,
}

impl HttpImageClient {
    pub fn new() -> Result<Self, SpecimenError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SpecimenError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("herbarium-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SpecimenError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| SpecimenError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SpecimenError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(status_error(status, response.text().ok()))
    }
}

fn status_error(status: StatusCode, body: Option<String>) -> SpecimenError {
    let message = body
        .filter(|body| !body.trim().is_empty())
        .unwrap_or_else(|| "image request failed".to_string());
    SpecimenError::HttpStatus {
        status: status.as_u16(),
        message,
    }
}

impl ImageClient for HttpImageClient {
    fn download(&self, url: &str) -> Result<Vec<u8>, SpecimenError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| SpecimenError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let bytes = response
            .bytes()
            .map_err(|err| SpecimenError::Http(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub already_present: usize,
    pub downloaded: usize,
    pub failed_urls: Vec<String>,
    pub missing_url: usize,
}

pub struct Fetcher<C: ImageClient> {
    client: C,
}

impl<C: ImageClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn fetch_missing(
        &self,
        records: &[SpecimenRecord],
        image_dir: &Path,
        failure_log: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<FetchReport, SpecimenError> {
        let mut present = existing_image_ids(image_dir)?;
        let pending = records
            .iter()
            .filter(|record| !present.contains(&record.image_id))
            .count();
        let mut report = FetchReport {
            already_present: records.len() - pending,
            ..FetchReport::default()
        };
        info!(
            already_present = report.already_present,
            pending, "resuming image download"
        );
        sink.event(ProgressEvent {
            message: format!(
                "phase=Fetch; already downloaded {}, will download the remaining {pending}",
                report.already_present
            ),
            elapsed: None,
        });

        let started = Instant::now();
        for record in records {
            if present.contains(&record.image_id) {
                continue;
            }
            let Some(url) = record.image_url.as_deref() else {
                warn!(image_id = %record.image_id, "no image url for record");
                report.missing_url += 1;
                continue;
            };
            let destination = image_dir.join(image_file_name(&record.image_id));
            match self
                .client
                .download(url)
                .and_then(|bytes| write_bytes_atomic(&destination, &bytes))
            {
                Ok(()) => {
                    present.insert(record.image_id.clone());
                    report.downloaded += 1;
                }
                Err(err) => {
                    warn!(image_id = %record.image_id, url, error = %err, "image download failed");
                    if let Err(log_err) = append_line(failure_log, url) {
                        warn!(error = %log_err, "could not record failed url");
                    }
                    report.failed_urls.push(url.to_string());
                }
            }
        }

        sink.event(ProgressEvent {
            message: format!(
                "phase=Fetch; downloaded {}, failed {}",
                report.downloaded,
                report.failed_urls.len()
            ),
            elapsed: Some(started.elapsed()),
        });
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn non_success_status_maps_to_http_status() {
        let err = status_error(StatusCode::NOT_FOUND, Some("no such image".to_string()));
        assert_matches!(err, SpecimenError::HttpStatus { status: 404, ref message } => {
            assert_eq!(message, "no such image");
        });
    }

    #[test]
    fn empty_error_body_gets_default_message() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, Some("  ".to_string()));
        assert_matches!(err, SpecimenError::HttpStatus { status: 503, ref message } => {
            assert_eq!(message, "image request failed");
        });
        let err = status_error(StatusCode::BAD_GATEWAY, None);
        assert_matches!(err, SpecimenError::HttpStatus { status: 502, .. });
    }
}
