//! HTML to plain text

use scraper::Html;

/// Strip markup from an HTML fragment, keeping text nodes verbatim.
///
/// Whitespace is not collapsed, so line breaks already present in the
/// fragment survive (the parser normalizes `\r\n` to `\n`). Entities are
/// decoded.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>()
}
