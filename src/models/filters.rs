// src/models/filters.rs

//! Search filter constraints and their request parameter encoding.

use serde::{Deserialize, Serialize};

/// Query parameter pairs sent with a search request.
pub type QueryParams = Vec<(String, String)>;

macro_rules! param_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $(
                #[cfg_attr(feature = "cli", value(name = $value))]
                $variant,
            )+
        }

        impl $name {
            /// Value sent to the search endpoint.
            pub fn as_param(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }
    };
}

param_enum!(
    /// Coarse image size bucket.
    ImageSize {
        Large => "large",
        Medium => "medium",
        Small => "small",
    }
);

param_enum!(
    /// Image orientation.
    Orientation {
        Horizontal => "horizontal",
        Vertical => "vertical",
        Square => "square",
    }
);

param_enum!(
    /// Image file type filter.
    FileType {
        Jpg => "jpg",
        Png => "png",
        Gifan => "gifan",
    }
);

param_enum!(
    /// Dominant color filter.
    Color {
        Color => "color",
        Gray => "gray",
        Red => "red",
        Orange => "orange",
        Cyan => "cyan",
        Yellow => "yellow",
        Green => "green",
        Blue => "blue",
        Violet => "violet",
        White => "white",
        Black => "black",
    }
);

param_enum!(
    /// Kind of image content.
    ContentType {
        Photo => "photo",
        Clipart => "clipart",
        Lineart => "lineart",
        Face => "face",
        Demotivator => "demotivator",
    }
);

/// Immutable set of optional constraints attached to a scraping session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub size: Option<ImageSize>,
    /// Exact resolution as (width, height); takes precedence over `size`
    pub exact_size: Option<(u32, u32)>,
    pub orientation: Option<Orientation>,
    pub file_type: Option<FileType>,
    pub color: Option<Color>,
    pub content_type: Option<ContentType>,
    pub commercial: bool,
    pub recent: bool,
}

impl SearchFilters {
    /// Translate the filters into request parameters.
    ///
    /// Always contains `nomisspell=1`; the per-request `text` and `p`
    /// parameters are added by the caller.
    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![("nomisspell".to_string(), "1".to_string())];
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        match (self.exact_size, self.size) {
            (Some((width, height)), _) => {
                push("isize", "eq".to_string());
                push("iw", width.to_string());
                push("ih", height.to_string());
            }
            (None, Some(size)) => push("isize", size.as_param().to_string()),
            (None, None) => {}
        }
        if let Some(orientation) = self.orientation {
            push("iorient", orientation.as_param().to_string());
        }
        if let Some(file_type) = self.file_type {
            push("type", file_type.as_param().to_string());
        }
        if let Some(color) = self.color {
            push("color", color.as_param().to_string());
        }
        if let Some(content_type) = self.content_type {
            push("itype", content_type.as_param().to_string());
        }
        if self.commercial {
            push("commercial", "1".to_string());
        }
        if self.recent {
            push("recent", "7D".to_string());
        }
        params
    }
}
