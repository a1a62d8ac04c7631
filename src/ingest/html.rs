//! HTML uploads: any element carrying a `data-odds` attribute.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{parse_point, ExtractedLine, QuoteExtractor};
use crate::error::FormatError;
use crate::market::OddsValue;

/// Elements priced by the page.
static ODDS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-odds]").expect("valid selector"));

/// Attributes tried in order for the selection label.
const LABEL_ATTRIBUTES: &[&str] = &["data-team", "data-selection", "data-name", "aria-label"];

/// Extractor for HTML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl QuoteExtractor for HtmlExtractor {
    fn format_name(&self) -> &'static str {
        "html"
    }

    fn extract_quote_tuples(&self, input: &str) -> Result<Vec<ExtractedLine>, FormatError> {
        let document = Html::parse_document(input);
        let mut lines = Vec::new();

        for element in document.select(&ODDS_SELECTOR) {
            let Some(odds) = element.value().attr("data-odds") else {
                continue;
            };

            let Some(label) = label_of(&element) else {
                debug!(odds = %odds, "Skipping data-odds element without a label");
                continue;
            };

            let mut line = ExtractedLine::new(label, OddsValue::Text(odds.trim().to_string()));
            line.point = element.value().attr("data-point").and_then(parse_point);
            lines.push(line);
        }

        debug!(lines = lines.len(), "Parsed HTML upload");

        if lines.is_empty() {
            return Err(FormatError::NoLinesFound {
                format: self.format_name(),
            });
        }
        Ok(lines)
    }
}

/// Label from the first non-empty label attribute, else the element's text.
fn label_of(element: &ElementRef<'_>) -> Option<String> {
    LABEL_ATTRIBUTES
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn label_attributes_take_precedence() {
        let input = r#"
            <div class="market">
              <button data-odds="-135" data-team="Kansas City Chiefs">KC -135</button>
              <button data-odds='+115' aria-label="Baltimore Ravens">BAL +115</button>
            </div>"#;

        let lines = HtmlExtractor.extract_quote_tuples(input).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, "Kansas City Chiefs");
        assert_eq!(lines[0].odds, OddsValue::Text("-135".to_string()));
        assert_eq!(lines[1].label, "Baltimore Ravens");
        assert_eq!(lines[1].odds, OddsValue::Text("+115".to_string()));
    }

    #[test]
    fn falls_back_to_inner_text() {
        let input = r#"<span data-odds="-110" data-point="-2.5"><b>Lions</b> &amp; spread</span>"#;

        let lines = HtmlExtractor.extract_quote_tuples(input).unwrap();

        assert_eq!(lines[0].label, "Lions & spread");
        assert_eq!(lines[0].point, Some(dec!(-2.5)));
    }

    #[test]
    fn unquoted_attributes_are_read() {
        let input = "<button data-odds=-110 data-team=Bills data-point=+3>Bills -110</button>";

        let lines = HtmlExtractor.extract_quote_tuples(input).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, "Bills");
        assert_eq!(lines[0].odds, OddsValue::Text("-110".to_string()));
        assert_eq!(lines[0].point, Some(dec!(3)));
    }

    #[test]
    fn angle_bracket_inside_attribute_value() {
        let input = r#"<button title="KC > BUF" data-odds="-110" data-team="Bills">x</button>"#;

        let lines = HtmlExtractor.extract_quote_tuples(input).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, "Bills");
    }

    #[test]
    fn documents_without_odds_fail() {
        let err = HtmlExtractor
            .extract_quote_tuples("<p data-team=\"Bears\">Bears</p>")
            .unwrap_err();
        assert!(matches!(err, FormatError::NoLinesFound { format: "html" }));
    }
}
