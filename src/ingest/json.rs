//! JSON uploads: `{"lines": [...]}` or a bare array of line objects.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use super::{parse_point, parse_timestamp, ExtractedLine, QuoteExtractor};
use crate::error::FormatError;
use crate::market::OddsValue;

/// Keys tried in order for the selection label.
const LABEL_KEYS: &[&str] = &["label", "team", "selection", "name"];

/// Extractor for JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl QuoteExtractor for JsonExtractor {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn extract_quote_tuples(&self, input: &str) -> Result<Vec<ExtractedLine>, FormatError> {
        let document: Value = serde_json::from_str(input)?;

        let entries = match &document {
            Value::Object(map) => match map.get("lines") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(FormatError::MissingLines),
            },
            Value::Array(entries) => entries,
            _ => return Err(FormatError::MissingLines),
        };

        let lines: Vec<ExtractedLine> = entries.iter().filter_map(extract_entry).collect();
        debug!(entries = entries.len(), lines = lines.len(), "Parsed JSON upload");

        if lines.is_empty() {
            return Err(FormatError::NoLinesFound {
                format: self.format_name(),
            });
        }
        Ok(lines)
    }
}

fn extract_entry(entry: &Value) -> Option<ExtractedLine> {
    let object = entry.as_object()?;

    let label = LABEL_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(scalar_text)?;
    let odds = odds_value(object.get("odds")?)?;

    let mut line = ExtractedLine::new(label, odds);
    line.point = object.get("point").and_then(point_value);
    line.source = object.get("source").and_then(scalar_text);
    line.market = object.get("market").and_then(scalar_text);
    line.observed_at = object
        .get("observed_at")
        .and_then(Value::as_str)
        .and_then(|value| match parse_timestamp(value) {
            Ok(at) => Some(at),
            Err(e) => {
                warn!(error = %e, "Ignoring capture time");
                None
            }
        });

    Some(line)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn odds_value(value: &Value) -> Option<OddsValue> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(OddsValue::Integer)
            .or_else(|| n.as_f64().map(OddsValue::Float)),
        Value::String(s) => Some(OddsValue::Text(s.clone())),
        _ => None,
    }
}

fn point_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => parse_point(s),
        _ => None,
    }
}
