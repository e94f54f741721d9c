// src/models/mod.rs

//! Domain models for the downloader.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod browser;
mod config;
mod filters;
mod result;

// Re-export all public types
pub use browser::Browser;
pub use config::{Config, FetchConfig, PoolConfig, SearchConfig};
pub use filters::{Color, ContentType, FileType, ImageSize, Orientation, QueryParams, SearchFilters};
pub use result::{ImageResult, KeywordResult, PageResult, RunResult, Status};
