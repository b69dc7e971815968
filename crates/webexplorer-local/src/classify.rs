//! Content-type labels for extracted pages.

use crate::select::PageExtract;

/// Labels a fetched page so clients can route it (render code differently,
/// thread Q&A, etc). Implementations must be cheap: they run on every
/// extraction and see only the URL plus the already-extracted structure.
pub trait ContentClassifier: Send + Sync {
    fn classify(&self, url: &str, extract: &PageExtract) -> &'static str;
}

/// URL- and structure-based heuristics. First match wins; pages with a real
/// `<article>` element that match nothing else are labeled `article`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl ContentClassifier for HeuristicClassifier {
    fn classify(&self, url: &str, extract: &PageExtract) -> &'static str {
        let u = url.to_ascii_lowercase();

        if u.contains("stackoverflow.com")
            || u.contains("stackexchange.com")
            || u.contains("/questions/")
        {
            return "qa";
        }
        if u.contains("discourse")
            || u.contains("reddit.com")
            || u.contains("forum")
            || u.contains("/issues/")
        {
            return "discussion";
        }
        if (u.contains("github.com") && (u.contains("/blob/") || u.contains("/raw/")))
            || u.contains("gist.github.com")
        {
            return "code";
        }
        if extract.has_article {
            return "article";
        }
        "webpage"
    }
}
