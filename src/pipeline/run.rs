// src/pipeline/run.rs

//! Running a list of keywords, and the single-image shortcut.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{ImageResult, RunResult};
use crate::services::ImageFetcher;
use crate::utils::Interrupt;

use super::downloader::Downloader;

/// Result of a run, together with the abort that ended it early, if any.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: RunResult,
    pub abort: Option<AppError>,
}

impl RunOutcome {
    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }
}

impl Downloader {
    /// Scrape every keyword in order with a quota of `quota` images each.
    ///
    /// An abort stops the run; the keywords finished before it are kept in
    /// the returned tree. Its status is Fail only if no keyword finished.
    pub async fn run(&mut self, keywords: &[String], quota: usize) -> RunOutcome {
        let mut results = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            log::info!("Downloading images for {keyword}...");
            match self.scrape_keyword(keyword, quota).await {
                Ok(result) => {
                    if !result.status.is_success() {
                        log::warn!("  {}", result.message);
                    }
                    results.push(result);
                }
                Err(e) => {
                    log::error!("Run aborted while scraping {keyword}: {e}");
                    return RunOutcome {
                        result: RunResult::aborted(results, e.to_string()),
                        abort: Some(e),
                    };
                }
            }
        }

        RunOutcome {
            result: RunResult::completed(results),
            abort: None,
        }
    }
}

/// Download one image straight into `output_dir`, without a search session.
pub async fn download_single_image(
    fetcher: &ImageFetcher,
    url: &str,
    output_dir: &Path,
    interrupt: &Interrupt,
) -> Result<ImageResult> {
    log::info!("Downloading a single image: {url}");
    interrupt
        .guard(fetcher.fetch(url, output_dir, "", None))
        .await
}
