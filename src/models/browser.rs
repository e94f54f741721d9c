//! Browser profiles for the search session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Browser engine whose profile the search session presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Browser {
    #[cfg_attr(feature = "cli", value(name = "Chrome"))]
    Chrome,
    #[cfg_attr(feature = "cli", value(name = "Edge"))]
    Edge,
    #[cfg_attr(feature = "cli", value(name = "Firefox"))]
    Firefox,
    #[cfg_attr(feature = "cli", value(name = "Safari"))]
    Safari,
}

impl Browser {
    /// User-Agent header sent by this profile.
    pub fn user_agent(&self) -> &'static str {
        match self {
            Browser::Chrome => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36"
            }
            Browser::Edge => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.0.0"
            }
            Browser::Firefox => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0"
            }
            Browser::Safari => {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15"
            }
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Browser::Chrome => "Chrome",
            Browser::Edge => "Edge",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
        };
        f.write_str(name)
    }
}
