//! Splitting a long document into independently exported chunks.

use crate::config::ChunkPolicy;

/// Text segments to render for `policy`.
///
/// `MaxPages` splits after rendering, so the text stays whole here.
pub fn split_text(text: &str, policy: ChunkPolicy) -> Vec<String> {
    match policy {
        ChunkPolicy::MaxChars(n) => split_chars(text, n),
        ChunkPolicy::None | ChunkPolicy::MaxPages(_) => vec![text.to_string()],
    }
}

/// Split every `max_chars` characters (not bytes). The last chunk holds the
/// remainder. `max_chars == 0` or empty text yields one chunk.
pub fn split_chars(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Group rendered pages, `per_chunk` at a time. The last group may be
/// shorter.
pub fn group_pages<T>(pages: Vec<T>, per_chunk: usize) -> Vec<Vec<T>> {
    if per_chunk == 0 {
        return vec![pages];
    }
    let mut groups = Vec::with_capacity(pages.len().div_ceil(per_chunk));
    let mut iter = pages.into_iter().peekable();
    while iter.peek().is_some() {
        groups.push(iter.by_ref().take(per_chunk).collect());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hundred_by_five_hundred() {
        let text = "a".repeat(1200);
        let chunks = split_chars(&text, 500);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(sizes, vec![500, 500, 200]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = split_chars(&"b".repeat(1000), 500);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let chunks = split_chars("你好世界", 3);
        assert_eq!(chunks, vec!["你好世".to_string(), "界".to_string()]);
    }

    #[test]
    fn shorter_text_is_one_chunk() {
        assert_eq!(split_chars("short", 500), vec!["short".to_string()]);
        assert_eq!(split_text("short", ChunkPolicy::None).len(), 1);
        assert_eq!(split_text("short", ChunkPolicy::MaxPages(1)).len(), 1);
    }

    #[test]
    fn five_pages_by_two() {
        let groups = group_pages(vec![1, 2, 3, 4, 5], 2);
        assert_eq!(groups, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }
}
