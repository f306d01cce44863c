//! Splitting outgoing text to fit the platform's single-message limit.
//!
//! Lengths are counted in Unicode scalar values, so a cut never lands inside a
//! UTF-8 sequence. Concatenating the pieces always yields the input again.

/// Positional split: every piece except the last holds exactly `max_len` chars.
///
/// An empty input yields no pieces. `max_len == 0` is treated as 1.
pub fn chunk(text: &str, max_len: usize) -> Vec<String> {
    chunk_at_boundaries(text, max_len, &[])
}

/// Like [`chunk`], but when a window contains one of `boundaries` (ascending
/// byte offsets into `text`) the cut moves back to the last such offset.
///
/// Windows without a usable boundary fall back to the positional cut, so a
/// single token longer than `max_len` is still split.
pub fn chunk_at_boundaries(text: &str, max_len: usize, boundaries: &[usize]) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut out = Vec::new();
    let mut offset = 0usize;

    while offset < text.len() {
        let rest = &text[offset..];
        let Some((window_end, _)) = rest.char_indices().nth(max_len) else {
            out.push(rest.to_string());
            break;
        };

        let limit = offset + window_end;
        let idx = boundaries.partition_point(|&b| b <= limit);
        let cut = match idx.checked_sub(1).map(|i| boundaries[i]) {
            Some(b) if b > offset && text.is_char_boundary(b) => b,
            _ => limit,
        };

        out.push(text[offset..cut].to_string());
        offset = cut;
    }

    out
}
