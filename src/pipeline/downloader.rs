// src/pipeline/downloader.rs

//! The stateful core shared by the page, keyword and run stages.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::models::{Config, QueryParams, SearchFilters};
use crate::services::{CaptchaGate, DispatchStrategy};
use crate::utils::Interrupt;

/// Fixed settings of a scraping session.
#[derive(Debug, Clone)]
pub struct DownloaderSettings {
    pub endpoint: Url,
    pub output_dir: PathBuf,
    pub page_delay: Duration,
    pub max_images_per_page: usize,
}

impl DownloaderSettings {
    /// Settings from a configuration, which is validated first.
    pub fn from_config(config: &Config, output_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: Url::parse(&config.search.endpoint)?,
            output_dir: output_dir.into(),
            page_delay: config.search.page_delay(),
            max_images_per_page: config.search.max_images_per_page,
        })
    }
}

/// Drives search pages through the CAPTCHA gate and hands image URLs to
/// the dispatch strategy.
///
/// Owns the search session (inside the gate); only the control flow
/// touches it. See `page.rs`, `keyword.rs` and `run.rs` for the stages.
pub struct Downloader {
    pub(super) gate: CaptchaGate,
    pub(super) dispatch: Box<dyn DispatchStrategy>,
    pub(super) settings: DownloaderSettings,
    /// Filter parameters, translated once and sent with every page request
    pub(super) filter_params: QueryParams,
    pub(super) interrupt: Interrupt,
}

impl Downloader {
    pub fn new(
        gate: CaptchaGate,
        dispatch: Box<dyn DispatchStrategy>,
        filters: &SearchFilters,
        settings: DownloaderSettings,
        interrupt: Interrupt,
    ) -> Self {
        log::info!(
            "Output directory is set to \"{}/\"",
            settings.output_dir.display()
        );
        Self {
            gate,
            dispatch,
            filter_params: filters.to_params(),
            settings,
            interrupt,
        }
    }

    pub fn settings(&self) -> &DownloaderSettings {
        &self.settings
    }

    /// Stop the workers (bounded by `drain`) and release the session.
    pub async fn shutdown(mut self, drain: Duration) -> Result<()> {
        self.dispatch.shutdown(drain).await;
        self.gate.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_settings_from_default_config() {
        let settings = DownloaderSettings::from_config(&Config::default(), "downloads").unwrap();
        assert_eq!(settings.endpoint.as_str(), "https://yandex.ru/images/search");
        assert_eq!(settings.output_dir, PathBuf::from("downloads"));
        assert_eq!(settings.page_delay, Duration::from_millis(500));
        assert_eq!(settings.max_images_per_page, 30);
    }

    #[test]
    fn test_settings_reject_invalid_config() {
        let mut config = Config::default();
        config.search.max_images_per_page = 0;
        assert!(matches!(
            DownloaderSettings::from_config(&config, "downloads"),
            Err(AppError::Validation(_))
        ));
    }
}
