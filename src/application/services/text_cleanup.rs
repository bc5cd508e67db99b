use regex::Regex;
use std::sync::LazyLock;

// Dot leaders from tables of contents ("Introduction........ 3")
static DOT_LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{3,}").expect("dot leader pattern is valid"));

/// Normalizes extracted PDF text before it is chunked and embedded.
///
/// Null bytes are removed first so that dots separated only by a null byte are
/// collapsed in the same pass, which keeps the transform idempotent.
pub fn clean_text(text: &str) -> String {
    let without_nulls = text.replace('\0', "");
    DOT_LEADER.replace_all(&without_nulls, " ").into_owned()
}
