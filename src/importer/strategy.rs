use html_escape::decode_html_entities;
use log::debug;
use scraper::{ElementRef, Html, Selector};

use super::duration::convert_duration;
use crate::error::ParsingError;

/// One way of reading a field out of a document. Fields carry an ordered
/// list of these; the first that yields a non-blank value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Text content of the first element matching the selector
    Text(&'static str),
    /// Attribute of the first element matching the selector
    Attribute {
        selector: &'static str,
        attribute: &'static str,
    },
    /// Attribute holding an ISO 8601 duration such as `PT1H30M`
    Duration {
        selector: &'static str,
        attribute: &'static str,
    },
}

impl Extraction {
    pub fn selector(&self) -> &'static str {
        match self {
            Extraction::Text(selector)
            | Extraction::Attribute { selector, .. }
            | Extraction::Duration { selector, .. } => *selector,
        }
    }

    /// Runs this strategy alone. Only the first matching element is looked
    /// at; `None` means no match or a blank value.
    pub fn apply(&self, document: &Html) -> Result<Option<String>, ParsingError> {
        let selector = compile(self.selector())?;
        let Some(element) = document.select(&selector).next() else {
            return Ok(None);
        };

        let value = match self {
            Extraction::Text(_) => element_text(element),
            Extraction::Attribute { attribute, .. } => attribute_value(element, attribute),
            Extraction::Duration { attribute, .. } => {
                convert_duration(&attribute_value(element, attribute))
            }
        };

        Ok(Some(value).filter(|v| !v.is_empty()))
    }
}

/// Tries each strategy in order and returns the first non-blank value,
/// or an empty string when none matched.
pub fn first_match(document: &Html, strategies: &[Extraction]) -> Result<String, ParsingError> {
    for strategy in strategies {
        if let Some(value) = strategy.apply(document)? {
            debug!("Matched `{}`", strategy.selector());
            return Ok(value);
        }
    }
    Ok(String::new())
}

pub fn compile(selector: &str) -> Result<Selector, ParsingError> {
    Selector::parse(selector).map_err(|e| ParsingError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Descendant text with whitespace runs collapsed and the ends trimmed
pub fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute_value(element: ElementRef, attribute: &str) -> String {
    element
        .value()
        .attr(attribute)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Texts of every element yielded, blanks dropped
pub fn non_blank_texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// WordPress output is sometimes entity-encoded twice (`&amp;#8217;`);
/// the parser undoes one level, this undoes the other.
pub fn decode_html_symbols(text: &str) -> String {
    decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: &[Extraction] = &[Extraction::Text("h1.entry-title"), Extraction::Text("h2")];

    #[test]
    fn test_first_strategy_wins() {
        let document = Html::parse_document(
            r#"<h1 class="entry-title">  Pad   Thai </h1><h2>Other</h2>"#,
        );
        assert_eq!(first_match(&document, TITLE).unwrap(), "Pad Thai");
    }

    #[test]
    fn test_blank_value_falls_through() {
        let document = Html::parse_document(r#"<h1 class="entry-title">   </h1><h2>Fallback</h2>"#);
        assert_eq!(first_match(&document, TITLE).unwrap(), "Fallback");
    }

    #[test]
    fn test_only_first_element_is_consulted() {
        // An empty first match does not look at later elements of the same selector
        let document = Html::parse_document(
            r#"<h1 class="entry-title"></h1><h1 class="entry-title">Second</h1>"#,
        );
        assert_eq!(
            first_match(&document, &[Extraction::Text("h1.entry-title")]).unwrap(),
            ""
        );
    }

    #[test]
    fn test_attribute_and_duration_strategies() {
        let document = Html::parse_document(
            r#"<head>
                <meta property="og:image" content=" https://example.com/a.jpg ">
                <meta itemprop="cookTime" content="PT1H30M">
            </head>"#,
        );

        let image = Extraction::Attribute {
            selector: r#"meta[property="og:image"]"#,
            attribute: "content",
        };
        let cook = Extraction::Duration {
            selector: r#"meta[itemprop="cookTime"]"#,
            attribute: "content",
        };

        assert_eq!(
            image.apply(&document).unwrap().as_deref(),
            Some("https://example.com/a.jpg")
        );
        assert_eq!(
            cook.apply(&document).unwrap().as_deref(),
            Some("1 hour 30 minutes")
        );
    }

    #[test]
    fn test_missing_everything_yields_empty_string() {
        let document = Html::parse_document("<p>nothing here</p>");
        assert_eq!(first_match(&document, TITLE).unwrap(), "");
    }

    #[test]
    fn test_invalid_selector_is_a_parsing_error() {
        let document = Html::parse_document("<p></p>");
        let err = Extraction::Text("p[").apply(&document).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidSelector { .. }));
    }

    #[test]
    fn test_decode_double_encoded_entities() {
        let document =
            Html::parse_document(r#"<meta name="description" content="Mom&amp;#8217;s pie">"#);
        let raw = Extraction::Attribute {
            selector: r#"meta[name="description"]"#,
            attribute: "content",
        }
        .apply(&document)
        .unwrap()
        .unwrap();

        assert_eq!(raw, "Mom&#8217;s pie");
        assert_eq!(decode_html_symbols(&raw), "Mom\u{2019}s pie");
    }
}
