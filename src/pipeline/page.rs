// src/pipeline/page.rs

//! Scraping a single result page.

use futures::future::join_all;

use crate::error::Result;
use crate::models::{ImageResult, PageResult};
use crate::services::{FetchHandle, FetchJob, extract};

use super::downloader::Downloader;

/// Directory name for a keyword's downloads, always a single path
/// component below the output directory.
pub(super) fn keyword_directory(keyword: &str) -> String {
    let name = keyword.replace(['/', '\\'], "_");
    match name.trim() {
        "" => "_".to_string(),
        "." | ".." => name.replace('.', "_"),
        _ => name,
    }
}

impl Downloader {
    /// Request one page of results and download its images.
    ///
    /// Never dispatches more downloads than `quota - images_so_far`. A page
    /// whose request fails is reported as Fail with a full page of errors;
    /// otherwise the page is Success regardless of individual images.
    /// Only aborts are returned as errors.
    pub async fn scrape_page(
        &mut self,
        keyword: &str,
        page_index: u32,
        images_so_far: usize,
        quota: usize,
    ) -> Result<PageResult> {
        let lost = self.settings.max_images_per_page;
        let mut params = vec![
            ("text".to_string(), keyword.to_string()),
            ("p".to_string(), page_index.to_string()),
        ];
        params.extend(self.filter_params.iter().cloned());

        let response = match self.gate.guarded_get(&self.settings.endpoint, &params).await {
            Ok(response) => response,
            Err(e) if e.is_abort() => return Err(e),
            Err(e) => {
                log::warn!("  Page {page_index} request failed: {e}");
                return Ok(PageResult::failed(
                    page_index,
                    format!("Page request failed. page: {page_index}, error: {e}"),
                    lost,
                ));
            }
        };

        if !response.is_ok() {
            log::warn!("  Page {page_index} response is not ok: {}", response.status);
            return Ok(PageResult::failed(
                page_index,
                format!(
                    "Page response is not ok. page: {page_index}, status_code: {}.",
                    response.status
                ),
                lost,
            ));
        }

        let urls = match extract::image_urls(&response.body) {
            Ok(urls) => urls,
            Err(e) => {
                return Ok(PageResult::failed(
                    page_index,
                    format!("Failed to read page {page_index}: {e}"),
                    lost,
                ));
            }
        };

        let subdirectory = keyword_directory(keyword);
        let mut handles = Vec::new();
        for url in urls {
            if images_so_far + handles.len() >= quota {
                break;
            }
            let job = FetchJob {
                url: url.clone(),
                output_dir: self.settings.output_dir.clone(),
                subdirectory: subdirectory.clone(),
            };
            let handle = match self.interrupt.guard(self.dispatch.dispatch(job)).await? {
                Ok(handle) => handle,
                Err(e) => FetchHandle::ready(ImageResult::fail(url, format!("[dispatch] {e}"))),
            };
            handles.push(handle);
        }

        let images = self
            .interrupt
            .guard(join_all(handles.into_iter().map(FetchHandle::resolve)))
            .await?;

        Ok(PageResult::completed(page_index, images))
    }
}
