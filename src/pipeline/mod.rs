//! Scraping pipeline.
//!
//! A [`Downloader`] drives the stages top-down:
//! - `run`: every keyword in order, stopping only on abort
//! - `scrape_keyword`: pages of one keyword until its quota is met
//! - `scrape_page`: one result page and its image downloads

mod downloader;
mod keyword;
mod page;
mod run;

pub use downloader::{Downloader, DownloaderSettings};
pub use run::{RunOutcome, download_single_image};
