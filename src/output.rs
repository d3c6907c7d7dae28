use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_run(result: &RunResult) {
        println!("Specimen summary for {}", result.save_dir);
        println!(
            "  metadata: {} of {} rows kept ({} incomplete, {} duplicate)",
            result.clean.rows_out,
            result.clean.rows_in,
            result.clean.dropped_incomplete,
            result.clean.dropped_duplicate
        );
        println!(
            "  images: {} already present, {} downloaded, {} failed",
            result.fetch.already_present,
            result.fetch.downloaded,
            result.fetch.failed_urls.len()
        );
        if result.fetch.missing_url > 0 {
            println!("  records without url: {}", result.fetch.missing_url);
        }
        if let Some(bad) = &result.bad_images {
            println!("  bad images: {}", bad.len());
        }
        println!("  canonical table: {}", result.metadata_path);
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.1}s)", event.message, elapsed.as_secs_f64()),
            None => eprintln!("{}", event.message),
        }
    }
}
