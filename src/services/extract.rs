// src/services/extract.rs

//! Embedded payload extraction from search result pages.
//!
//! Result markup carries its data as JSON in `data-bem` attributes:
//!
//! ```html
//! <div class="serp-list" data-bem='{"serp-list":{"lastPage":2}}'>
//!   <div class="serp-item" data-bem='{"serp-item":{"img_href":"https://..."}}'></div>
//! </div>
//! ```

use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{AppError, Result};

const ITEM_SELECTOR: &str = "div.serp-item";
const LIST_SELECTOR: &str = "div.serp-list";
const PAYLOAD_ATTR: &str = "data-bem";

#[derive(Debug, Deserialize)]
struct ItemPayload {
    #[serde(rename = "serp-item")]
    item: SerpItem,
}

#[derive(Debug, Deserialize)]
struct SerpItem {
    img_href: String,
}

#[derive(Debug, Deserialize)]
struct ListPayload {
    #[serde(rename = "serp-list")]
    list: SerpList,
}

#[derive(Debug, Deserialize)]
struct SerpList {
    #[serde(rename = "lastPage")]
    last_page: u32,
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Image source URLs of all result items, in page order.
///
/// Items without a payload or with an undecodable one are skipped.
pub fn image_urls(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = parse_selector(ITEM_SELECTOR)?;

    let urls = document
        .select(&selector)
        .filter_map(|element| {
            let raw = element.value().attr(PAYLOAD_ATTR)?;
            match serde_json::from_str::<ItemPayload>(raw) {
                Ok(payload) => Some(payload.item.img_href),
                Err(e) => {
                    log::warn!("Skipping result item with malformed payload: {e}");
                    None
                }
            }
        })
        .collect();
    Ok(urls)
}

/// Zero-based index of the last result page.
///
/// `Ok(None)` means the page has no result list at all.
pub fn last_page(html: &str) -> Result<Option<u32>> {
    let document = Html::parse_document(html);
    let selector = parse_selector(LIST_SELECTOR)?;

    let Some(element) = document.select(&selector).next() else {
        return Ok(None);
    };
    let raw = element
        .value()
        .attr(PAYLOAD_ATTR)
        .ok_or_else(|| AppError::payload("serp-list", "missing data-bem attribute"))?;
    let payload: ListPayload =
        serde_json::from_str(raw).map_err(|e| AppError::payload("serp-list", e))?;
    Ok(Some(payload.list.last_page))
}
