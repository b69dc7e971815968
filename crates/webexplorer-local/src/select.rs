//! Structured extraction from sanitized HTML.
//!
//! Splits readable text into two non-overlapping pools: `article_body` (text
//! blocks inside the first `<article>`, else `<main>`) and the secondary pool
//! (blocks outside that container, filtered to >30 chars). Pagination applies
//! to the secondary pool only, so the article text is never truncated.

use std::collections::BTreeMap;

use html_scraper::{ElementRef, Html, Selector};
use url::Url;
use webexplorer_core::{Error, Heading, Image, Link, Result};

use crate::sanitize::{is_removed, is_stripped};

/// Block-level elements that contribute extractable text.
const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, td";

/// Minimum text length (chars) for a block outside the primary container.
/// Shorter blocks are almost always chrome: buttons, timestamps, nav labels.
const SECONDARY_MIN_CHARS: usize = 30;

#[derive(Debug, Clone, Default)]
pub struct PageExtract {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub headings: Vec<Heading>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub metadata: BTreeMap<String, String>,
    /// Newline-joined text blocks inside the primary container.
    pub article_body: String,
    /// Whitespace-normalized text from blocks outside the primary container.
    pub secondary_text: String,
    /// Whether the primary container was an `<article>` element.
    pub has_article: bool,
}

fn sel(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("bad selector {css:?}: {e}")))
}

/// Element text the way a reader sees it: each text node trimmed, non-empty
/// segments joined by a single space.
fn block_text(el: &ElementRef) -> String {
    let mut out = String::new();
    for t in el.text() {
        let t = t.trim();
        if t.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(t);
    }
    out
}

/// Collapse every whitespace run (including newlines) to a single space.
fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_inside(el: &ElementRef, container: &ElementRef) -> bool {
    el.id() == container.id() || el.ancestors().any(|a| a.id() == container.id())
}

fn resolve_url(base: Option<&Url>, raw: &str) -> String {
    match Url::parse(raw) {
        Ok(u) => u.to_string(),
        Err(_) => base
            .and_then(|b| b.join(raw).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// Extract everything we report about a page. `base_url` (normally the
/// post-redirect URL) anchors relative link/image targets.
pub fn extract_page(html: &str, base_url: &str) -> Result<PageExtract> {
    let doc = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut out = PageExtract::default();

    if let Some(title_el) = doc.select(&sel("title")?).next() {
        let t = block_text(&title_el);
        if !t.is_empty() {
            out.title = Some(t);
        }
    }

    for meta in doc.select(&sel("meta")?) {
        let v = meta.value();
        let key = v.attr("name").or_else(|| v.attr("property"));
        if let (Some(key), Some(content)) = (key, v.attr("content")) {
            if !key.trim().is_empty() {
                out.metadata
                    .insert(key.trim().to_string(), content.trim().to_string());
            }
        }
    }
    out.description = out
        .metadata
        .get("description")
        .or_else(|| out.metadata.get("og:description"))
        .cloned();
    out.author = out.metadata.get("author").cloned();
    out.published_date = out
        .metadata
        .get("article:published_time")
        .or_else(|| out.metadata.get("date"))
        .cloned();

    for h in doc.select(&sel("h1, h2, h3")?) {
        if is_removed(&h) {
            continue;
        }
        let text = block_text(&h);
        if text.is_empty() {
            continue;
        }
        // Tag names are always "h1".."h3" here; the digit is the level.
        let level = h.value().name().as_bytes()[1] - b'0';
        out.headings.push(Heading { level, text });
    }

    for a in doc.select(&sel("a[href]")?) {
        if is_removed(&a) {
            continue;
        }
        let href = a.value().attr("href").unwrap_or_default();
        if href.trim().is_empty() {
            continue;
        }
        out.links.push(Link {
            url: resolve_url(base.as_ref(), href.trim()),
            text: block_text(&a),
        });
    }

    for img in doc.select(&sel("img[src]")?) {
        if is_removed(&img) {
            continue;
        }
        let src = img.value().attr("src").unwrap_or_default();
        if src.trim().is_empty() {
            continue;
        }
        out.images.push(Image {
            url: resolve_url(base.as_ref(), src.trim()),
            alt: img.value().attr("alt").unwrap_or_default().trim().to_string(),
        });
    }

    let primary = doc
        .select(&sel("article")?)
        .find(|el| !is_removed(el))
        .map(|el| (el, true))
        .or_else(|| {
            doc.select(&Selector::parse("main").ok()?)
                .find(|el| !is_removed(el))
                .map(|el| (el, false))
        });

    let blocks = sel(BLOCK_SELECTOR)?;

    let mut article_blocks: Vec<String> = Vec::new();
    if let Some((container, is_article)) = &primary {
        out.has_article = *is_article;
        if !is_removed(container) {
            for block in container.select(&blocks) {
                if is_removed(&block) {
                    continue;
                }
                let text = block_text(&block);
                if !text.is_empty() {
                    article_blocks.push(text);
                }
            }
        }
    }
    out.article_body = article_blocks.join("\n");

    let mut secondary_blocks: Vec<String> = Vec::new();
    for block in doc.select(&blocks) {
        if is_removed(&block) {
            continue;
        }
        if let Some((container, _)) = &primary {
            if is_inside(&block, container) {
                continue;
            }
        }
        let text = block_text(&block);
        if text.chars().count() > SECONDARY_MIN_CHARS {
            secondary_blocks.push(text);
        }
    }
    out.secondary_text = norm_ws(&secondary_blocks.join("\n"));

    Ok(out)
}

/// Whole-document readable text with disqualified subtrees filtered out,
/// whitespace-normalized. Used by the raw-content path, which skips the
/// article/secondary split.
pub fn document_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut parts: Vec<String> = Vec::new();
    collect_text(&doc.root_element(), &mut parts);
    norm_ws(&parts.join(" "))
}

fn collect_text(el: &ElementRef, out: &mut Vec<String>) {
    if is_stripped(el) {
        return;
    }
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(&child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let t = text.trim();
            if !t.is_empty() {
                out.push(t.to_string());
            }
        }
    }
}
