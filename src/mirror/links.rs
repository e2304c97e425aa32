//! Reference extraction from saved documents
//!
//! Every element carrying an `href`, `src` or `link` attribute contributes one
//! candidate, except inline frames. When an element carries several of these
//! attributes, `href` wins over `src`, which wins over `link`.

use scraper::{Html, Selector};

/// Attributes that may reference an asset, in priority order
const REFERENCE_ATTRS: [&str; 3] = ["href", "src", "link"];

/// Elements whose references are never mirrored
const SKIPPED_ELEMENTS: [&str; 1] = ["iframe"];

/// Extracts raw reference values in document order
///
/// Values are trimmed; empty and fragment-only references are dropped.
/// Resolution and filtering happen later.
///
/// # Example
///
/// ```
/// use lightsns_mirror::mirror::extract_references;
///
/// let html = r#"<img src="/a.png"><iframe src="/frame"></iframe><a href="b.css" src="x">"#;
/// assert_eq!(extract_references(html), vec!["/a.png", "b.css"]);
/// ```
pub fn extract_references(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("[href], [src], [link]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| !SKIPPED_ELEMENTS.contains(&element.value().name()))
        .filter_map(|element| {
            REFERENCE_ATTRS
                .iter()
                .find_map(|attr| element.value().attr(attr))
        })
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.starts_with('#'))
        .map(str::to_string)
        .collect()
}
