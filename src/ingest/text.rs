//! OCR-derived text: `<label> <+/-odds>` pairs on each line.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{ExtractedLine, QuoteExtractor};
use crate::error::FormatError;
use crate::market::OddsValue;

/// A label of at least three characters followed by a signed price.
static LABEL_ODDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9 .&'/-]{3,}?)\s*([+-]\d{2,4})").expect("valid regex")
});

/// Extractor for plain OCR text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl QuoteExtractor for TextExtractor {
    fn format_name(&self) -> &'static str {
        "text"
    }

    fn extract_quote_tuples(&self, input: &str) -> Result<Vec<ExtractedLine>, FormatError> {
        let mut seen = HashSet::new();
        let mut lines = Vec::new();

        for raw_line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
            for capture in LABEL_ODDS.captures_iter(raw_line) {
                let label = capture[1].trim();
                if label.chars().count() <= 2 {
                    continue;
                }
                let Ok(odds) = capture[2].parse::<i64>() else {
                    continue;
                };

                if seen.insert((label.to_lowercase(), odds)) {
                    lines.push(ExtractedLine::new(label, OddsValue::Integer(odds)));
                }
            }
        }

        debug!(lines = lines.len(), "Parsed OCR text");

        if lines.is_empty() {
            return Err(FormatError::NoLinesFound {
                format: self.format_name(),
            });
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pairs_labels_with_prices() {
        let input = "Green Bay Packers +145\n\nChicago Bears -165\n";

        let lines = TextExtractor.extract_quote_tuples(input).unwrap();

        assert_eq!(
            lines,
            vec![
                ExtractedLine::new("Green Bay Packers", 145),
                ExtractedLine::new("Chicago Bears", -165),
            ]
        );
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let input = "PACKERS +145\npackers +145\nBears -165\nPackers +150";

        let lines = TextExtractor.extract_quote_tuples(input).unwrap();

        let labels: Vec<_> = lines.iter().map(|l| (l.label.as_str(), l.odds.clone())).collect();
        assert_eq!(
            labels,
            vec![
                ("PACKERS", OddsValue::Integer(145)),
                ("Bears", OddsValue::Integer(-165)),
                ("Packers", OddsValue::Integer(150)),
            ]
        );
    }

    #[test]
    fn short_labels_are_dropped() {
        let err = TextExtractor.extract_quote_tuples("KC -3\nno prices here").unwrap_err();
        assert!(matches!(err, FormatError::NoLinesFound { format: "text" }));
    }
}
