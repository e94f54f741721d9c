// src/pipeline/keyword.rs

//! Scraping all pages of one keyword.

use crate::error::Result;
use crate::models::KeywordResult;
use crate::services::extract;

use super::downloader::Downloader;

impl Downloader {
    /// Download up to `quota` images for `keyword`.
    ///
    /// Pages are scraped in order until `quota` images have been saved or
    /// the last page is done. Page and image failures are recorded in the
    /// result and never fail the keyword; only aborts are returned as
    /// errors.
    pub async fn scrape_keyword(&mut self, keyword: &str, quota: usize) -> Result<KeywordResult> {
        let params = vec![
            ("text".to_string(), keyword.to_string()),
            ("nomisspell".to_string(), "1".to_string()),
        ];
        let endpoint = self.settings.endpoint.clone();

        let response = match self.gate.guarded_get(&endpoint, &params).await {
            Ok(response) => response,
            Err(e) if e.is_abort() => return Err(e),
            Err(e) => {
                return Ok(KeywordResult::failed(
                    keyword,
                    format!("Failed to fetch a search page. url: {endpoint}, error: {e}"),
                ));
            }
        };

        if !response.is_ok() {
            return Ok(KeywordResult::failed(
                keyword,
                format!(
                    "Failed to fetch a search page. url: {endpoint}, text: {keyword}, status_code: {}",
                    response.status
                ),
            ));
        }

        let last_page = match extract::last_page(&response.body) {
            Ok(Some(last_page)) => last_page,
            Ok(None) => {
                let result = KeywordResult::empty(keyword);
                log::info!("    {}", result.message);
                return Ok(result);
            }
            Err(e) => return Ok(KeywordResult::failed(keyword, e.to_string())),
        };

        let total_pages = last_page as usize + 1;
        // Progress display only; the loop below stops on quota or last page.
        let mut estimate = 1 + quota
            .checked_div(self.settings.max_images_per_page)
            .unwrap_or(0);
        log::info!("  Found {total_pages} pages of {keyword}.");

        let mut pages = Vec::new();
        let mut images_so_far = 0;

        for page in 0..=last_page {
            if images_so_far >= quota {
                break;
            }

            let shown = page as usize + 1;
            if shown > estimate {
                estimate = shown;
            }
            log::info!(
                "  Scraping page {shown}/{}...",
                estimate.min(total_pages)
            );

            let result = self.scrape_page(keyword, page, images_so_far, quota).await?;
            images_so_far += result.downloaded_count();
            pages.push(result);

            if images_so_far < quota && page < last_page {
                self.interrupt
                    .guard(tokio::time::sleep(self.settings.page_delay))
                    .await?;
            }
        }

        Ok(KeywordResult::completed(keyword, pages))
    }
}
