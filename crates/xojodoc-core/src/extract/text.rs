//! Text helpers shared by the extractor.

use scraper::ElementRef;

/// Sphinx permalink marker appended to headings.
const HEADERLINK_MARKER: char = '\u{00b6}';

/// Collapse runs of whitespace into single spaces and trim.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element as one line.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Heading text without permalink markers.
pub(crate) fn heading_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    normalize_whitespace(&raw.replace(HEADERLINK_MARKER, " "))
}

/// Text of a preformatted block, verbatim.
///
/// The HTML parser already drops the single newline that may follow `<pre>`.
/// Blocks holding only whitespace count as absent.
pub(crate) fn code_text(element: ElementRef<'_>) -> Option<String> {
    let raw: String = element.text().collect();
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw)
    }
}

/// `Some(text)` unless the text is empty.
pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Whether any ancestor of `element` is one of `tags`.
pub(crate) fn has_ancestor(element: ElementRef<'_>, tags: &[&str]) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| tags.contains(&e.name()))
    })
}

/// Lowercased identifier form used for ids and header matching: `Read-Only` -> `readonly`.
pub(crate) fn slug(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
