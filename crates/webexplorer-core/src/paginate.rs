use crate::{Error, Result};

/// Ellipsis marker appended to a truncated page to signal more content follows.
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice {
    pub text: String,
    pub total_pages: usize,
    pub has_next: bool,
}

/// Split `content` into fixed-size character windows on demand.
///
/// Pages are 1-indexed; page `p` covers code points `[(p-1)*max_chars,
/// p*max_chars)`. Every non-final page carries a 3-char `...` suffix; the
/// final page is returned exactly. Requesting a page past the end yields an
/// empty slice (not an error). Counts are Unicode code points, not bytes.
pub fn paginate(content: &str, max_chars: usize, page: usize) -> Result<PageSlice> {
    if max_chars == 0 {
        return Err(Error::InvalidArgument("max_chars must be positive".to_string()));
    }
    if page == 0 {
        return Err(Error::InvalidArgument("page must be 1 or greater".to_string()));
    }

    let total_chars = content.chars().count();
    if total_chars == 0 {
        return Ok(PageSlice {
            text: String::new(),
            total_pages: 0,
            has_next: false,
        });
    }

    let total_pages = total_chars.div_ceil(max_chars);
    if page > total_pages {
        return Ok(PageSlice {
            text: String::new(),
            total_pages,
            has_next: false,
        });
    }

    let start = (page - 1) * max_chars;
    let mut text: String = content.chars().skip(start).take(max_chars).collect();
    let has_next = page < total_pages;
    if has_next {
        text.push_str(ELLIPSIS);
    }

    Ok(PageSlice {
        text,
        total_pages,
        has_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_content_yields_zero_pages() {
        let s = paginate("", 100, 1).unwrap();
        assert_eq!(s.text, "");
        assert_eq!(s.total_pages, 0);
        assert!(!s.has_next);
    }

    #[test]
    fn single_page_content_is_returned_verbatim() {
        let s = paginate("Short content", 100, 1).unwrap();
        assert_eq!(s.text, "Short content");
        assert_eq!(s.total_pages, 1);
        assert!(!s.has_next);
    }

    #[test]
    fn first_page_of_multi_page_content_carries_marker() {
        let content = "A".repeat(250);
        let s = paginate(&content, 100, 1).unwrap();
        assert_eq!(s.text.chars().count(), 103);
        assert!(s.text.ends_with("..."));
        assert_eq!(s.total_pages, 3);
        assert!(s.has_next);
    }

    #[test]
    fn middle_page_also_carries_marker() {
        let content = "A".repeat(250);
        let s = paginate(&content, 100, 2).unwrap();
        assert_eq!(s.text.chars().count(), 103);
        assert!(s.text.ends_with("..."));
        assert!(s.has_next);
    }

    #[test]
    fn last_page_is_exact_with_no_marker() {
        let content = "A".repeat(250);
        let s = paginate(&content, 100, 3).unwrap();
        assert_eq!(s.text.chars().count(), 50);
        assert!(!s.text.ends_with("..."));
        assert_eq!(s.total_pages, 3);
        assert!(!s.has_next);
    }

    #[test]
    fn exact_page_boundary() {
        let content = "A".repeat(200);
        let s = paginate(&content, 100, 1).unwrap();
        assert_eq!(s.text.chars().count(), 103);
        assert_eq!(s.total_pages, 2);
        assert!(s.has_next);

        let s = paginate(&content, 100, 2).unwrap();
        assert_eq!(s.text.chars().count(), 100);
        assert!(!s.has_next);
    }

    #[test]
    fn page_out_of_range_is_empty_not_an_error() {
        let content = "A".repeat(100);
        let s = paginate(&content, 100, 5).unwrap();
        assert_eq!(s.text, "");
        assert_eq!(s.total_pages, 1);
        assert!(!s.has_next);
    }

    #[test]
    fn zero_page_is_rejected() {
        let err = paginate("test content", 100, 0).unwrap_err();
        assert!(err.to_string().contains("page must be 1 or greater"));
    }

    #[test]
    fn zero_max_chars_is_rejected() {
        let err = paginate("test content", 0, 1).unwrap_err();
        assert!(err.to_string().contains("max_chars must be positive"));
    }

    #[test]
    fn unicode_content_is_counted_in_code_points() {
        let content = "Привет мир! ".repeat(50);
        let s = paginate(&content, 100, 1).unwrap();
        assert!(s.text.chars().count() <= 103);
        assert!(s.total_pages > 0);
    }

    proptest! {
        #[test]
        fn total_pages_is_ceil_of_len_over_max(
            content in ".{0,400}",
            max_chars in 1usize..120,
        ) {
            let len = content.chars().count();
            let s = paginate(&content, max_chars, 1).unwrap();
            let expected = len.div_ceil(max_chars);
            prop_assert_eq!(s.total_pages, expected);
        }

        #[test]
        fn pages_reconstruct_a_prefix_in_order(
            content in "[a-zA-Z0-9 ]{1,300}",
            max_chars in 1usize..80,
        ) {
            let first = paginate(&content, max_chars, 1).unwrap();
            let mut rebuilt = String::new();
            let mut last_seen = false;
            for p in 1..=first.total_pages {
                let s = paginate(&content, max_chars, p).unwrap();
                let raw = s.text.strip_suffix("...").unwrap_or(&s.text);
                rebuilt.push_str(raw);
                // Only the final page reports no next page.
                if p < first.total_pages {
                    prop_assert!(s.has_next);
                } else {
                    prop_assert!(!s.has_next);
                    last_seen = true;
                }
            }
            prop_assert!(last_seen);
            prop_assert_eq!(rebuilt, content);
        }

        #[test]
        fn out_of_range_pages_are_total(
            content in ".{0,200}",
            max_chars in 1usize..50,
            page in 1usize..100,
        ) {
            // Total for all valid inputs: never panics, never errors.
            let s = paginate(&content, max_chars, page).unwrap();
            prop_assert!(s.text.chars().count() <= max_chars + 3);
        }
    }
}
