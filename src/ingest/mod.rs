//! Upload extraction: turning JSON, HTML or OCR text into raw quote tuples.
//!
//! Each format implements [`QuoteExtractor`]. Extraction only recovers the
//! tuple shape; validation of odds, points and labels happens in
//! [`crate::market::normalize_quote`].

pub mod html;
pub mod json;
pub mod text;

use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::FormatError;
use crate::market::{OddsValue, RawQuote};

pub use html::HtmlExtractor;
pub use json::JsonExtractor;
pub use text::TextExtractor;

/// Extensions of screenshots, which need OCR before extraction.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// One line recovered from an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedLine {
    /// Selection label.
    pub label: String,
    /// Price as found.
    pub odds: OddsValue,
    /// Point, when the upload carried one.
    pub point: Option<Decimal>,
    /// Source override from the upload.
    pub source: Option<String>,
    /// Market override from the upload.
    pub market: Option<String>,
    /// Capture time from the upload.
    pub observed_at: Option<OffsetDateTime>,
}

impl ExtractedLine {
    /// Line with only a label and odds.
    pub fn new(label: impl Into<String>, odds: impl Into<OddsValue>) -> Self {
        Self {
            label: label.into(),
            odds: odds.into(),
            point: None,
            source: None,
            market: None,
            observed_at: None,
        }
    }

    /// Convert into a raw quote, filling fields the upload did not carry.
    pub fn into_raw(
        self,
        default_source: &str,
        default_market: &str,
        observed_at: OffsetDateTime,
    ) -> RawQuote {
        RawQuote {
            source: self.source.unwrap_or_else(|| default_source.to_string()),
            market: self.market.unwrap_or_else(|| default_market.to_string()),
            label: self.label,
            odds: self.odds,
            point: self.point,
            observed_at: Some(self.observed_at.unwrap_or(observed_at)),
        }
    }
}

/// Format-specific extraction of quote tuples from an upload.
pub trait QuoteExtractor {
    /// Short name of the format, used in errors.
    fn format_name(&self) -> &'static str;

    /// Extract every usable line from the document.
    fn extract_quote_tuples(&self, input: &str) -> Result<Vec<ExtractedLine>, FormatError>;
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// JSON document with a `lines` array.
    Json,
    /// HTML with `data-odds` attributes.
    Html,
    /// OCR-derived plain text.
    Text,
}

impl UploadFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(UploadFormat::Json),
            "html" | "htm" => Ok(UploadFormat::Html),
            "txt" => Ok(UploadFormat::Text),
            other => {
                if IMAGE_EXTENSIONS.contains(&other) {
                    tracing::warn!(extension = other, "Screenshots must be run through OCR first");
                }
                Err(FormatError::UnsupportedFormat {
                    extension: other.to_string(),
                })
            }
        }
    }

    /// Extractor for this format.
    pub fn extractor(&self) -> Box<dyn QuoteExtractor + Send + Sync> {
        match self {
            UploadFormat::Json => Box::new(JsonExtractor),
            UploadFormat::Html => Box::new(HtmlExtractor),
            UploadFormat::Text => Box::new(TextExtractor),
        }
    }

    /// Extract lines from a document in this format.
    pub fn extract(&self, input: &str) -> Result<Vec<ExtractedLine>, FormatError> {
        self.extractor().extract_quote_tuples(input)
    }
}

/// Parse a point written as text, ignoring anything unparseable.
pub(crate) fn parse_point(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    Decimal::from_str(unsigned).ok()
}

/// Parse an RFC 3339 timestamp.
pub(crate) fn parse_timestamp(value: &str) -> Result<OffsetDateTime, FormatError> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|_| FormatError::InvalidTimestamp {
        value: value.to_string(),
    })
}
