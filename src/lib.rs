// src/lib.rs

//! imgharvest: keyword-driven image search scraper and downloader.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
