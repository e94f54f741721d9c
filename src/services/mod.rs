//! Service layer for the downloader.
//!
//! This module contains the building blocks the pipeline drives:
//! - Search session transport (`SearchSession`, `HttpSession`)
//! - CAPTCHA handling around every search request (`CaptchaGate`)
//! - Embedded payload extraction (`extract`)
//! - Single-image download (`ImageFetcher`)
//! - Inline or pooled download dispatch (`DispatchStrategy`)

pub mod captcha;
pub mod dispatch;
pub mod extract;
pub mod fetcher;
pub mod session;

pub use captcha::{CaptchaGate, CaptchaReply, Challenge, OperatorPrompt, StdinPrompt};
pub use dispatch::{DispatchStrategy, FetchHandle, FetchJob, InlineDispatch, WorkerPool, strategy_for};
pub use fetcher::{FetchError, ImageFetcher};
pub use session::{HttpSession, PageResponse, SearchSession};
