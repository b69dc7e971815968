//! Visibility filtering over a parsed document.
//!
//! `scraper` trees are immutable, so instead of deleting nodes we decide, per
//! element, whether it sits inside a disqualified subtree. Every selector in
//! this crate filters through [`is_removed`], which is observably equivalent
//! to stripping the subtrees before extraction.

use html_scraper::ElementRef;

/// Tag kinds whose whole subtree is boilerplate or invisible to readers.
const STRIPPED_TAGS: [&str; 8] = [
    "script", "style", "noscript", "iframe", "footer", "header", "nav", "aside",
];

/// True when this element itself disqualifies its subtree.
pub fn is_stripped(el: &ElementRef) -> bool {
    let v = el.value();
    if STRIPPED_TAGS.contains(&v.name()) {
        return true;
    }
    if v.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(style) = v.attr("style") {
        // Substring match after dropping whitespace, not CSS parsing. Catches
        // "display: none" and "display:none" alike without a CSS dependency.
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.contains("display:none") || compact.contains("visibility:hidden") {
            return true;
        }
    }
    false
}

/// True when the element or any of its ancestors is stripped.
pub fn is_removed(el: &ElementRef) -> bool {
    if is_stripped(el) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|anc| is_stripped(&anc))
}
