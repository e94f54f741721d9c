// src/models/result.rs

//! Result tree produced by a download run.
//!
//! ```text
//! RunResult
//! └── KeywordResult   (one per keyword, in input order)
//!     └── PageResult  (one per scraped page)
//!         └── ImageResult (one per dispatched image URL)
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Final status of a result node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

/// Outcome of downloading one image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub status: Status,
    pub message: String,
    pub source_url: String,
    pub local_path: Option<PathBuf>,
}

impl ImageResult {
    pub fn success(source_url: impl Into<String>, local_path: PathBuf) -> Self {
        Self {
            status: Status::Success,
            message: "Downloaded the image.".to_string(),
            source_url: source_url.into(),
            local_path: Some(local_path),
        }
    }

    pub fn fail(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: message.into(),
            source_url: source_url.into(),
            local_path: None,
        }
    }
}

/// Outcome of scraping one search result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub status: Status,
    pub message: String,
    pub page_index: u32,
    pub error_count: usize,
    pub images: Vec<ImageResult>,
}

impl PageResult {
    /// Finalize a page whose request succeeded. The error count is taken
    /// from the resolved images.
    pub fn completed(page_index: u32, images: Vec<ImageResult>) -> Self {
        let error_count = images.iter().filter(|i| !i.status.is_success()).count();
        Self {
            status: Status::Success,
            message: format!("All successful images from page {page_index} downloaded."),
            page_index,
            error_count,
            images,
        }
    }

    /// A page whose request failed; counts as a full page of lost images.
    pub fn failed(page_index: u32, message: impl Into<String>, lost_images: usize) -> Self {
        Self {
            status: Status::Fail,
            message: message.into(),
            page_index,
            error_count: lost_images,
            images: Vec::new(),
        }
    }

    /// Number of images saved to disk from this page.
    pub fn downloaded_count(&self) -> usize {
        self.images.iter().filter(|i| i.status.is_success()).count()
    }
}

/// Outcome of scraping all pages for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub status: Status,
    pub message: String,
    pub keyword: String,
    pub error_count: usize,
    pub pages: Vec<PageResult>,
}

impl KeywordResult {
    pub fn completed(keyword: impl Into<String>, pages: Vec<PageResult>) -> Self {
        let keyword = keyword.into();
        let error_count = pages.iter().map(|p| p.error_count).sum();
        Self {
            status: Status::Success,
            message: format!("All images for {keyword} downloaded!"),
            keyword,
            error_count,
            pages,
        }
    }

    /// A keyword whose search returned no result list.
    pub fn empty(keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        Self {
            status: Status::Success,
            message: format!("no images found for keyword \"{keyword}\""),
            keyword,
            error_count: 0,
            pages: Vec::new(),
        }
    }

    pub fn failed(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: message.into(),
            keyword: keyword.into(),
            error_count: 0,
            pages: Vec::new(),
        }
    }

    pub fn downloaded_count(&self) -> usize {
        self.pages.iter().map(PageResult::downloaded_count).sum()
    }
}

/// Top-level summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: Status,
    pub message: String,
    pub keywords: Vec<KeywordResult>,
}

impl RunResult {
    pub fn completed(keywords: Vec<KeywordResult>) -> Self {
        Self {
            status: Status::Success,
            message: "Everything is downloaded!".to_string(),
            keywords,
        }
    }

    /// A run cut short; the keywords finished so far are kept.
    ///
    /// Fail only when no keyword finished before the abort.
    pub fn aborted(keywords: Vec<KeywordResult>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if keywords.is_empty() {
            return Self {
                status: Status::Fail,
                message: reason,
                keywords,
            };
        }
        Self {
            status: Status::Success,
            message: format!(
                "Stopped after {} keyword(s): {reason}",
                keywords.len()
            ),
            keywords,
        }
    }

    pub fn total_errors(&self) -> usize {
        self.keywords.iter().map(|k| k.error_count).sum()
    }

    pub fn downloaded_count(&self) -> usize {
        self.keywords.iter().map(KeywordResult::downloaded_count).sum()
    }
}
