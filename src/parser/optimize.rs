use super::normalize::{dedupe_lines, normalize, remove_hidden};

/// Canonical pre-processing pass applied to every markdown body.
///
/// `normalize(remove_hidden(dedupe_lines(normalize(text))))`; re-running it
/// on its own output is a no-op.
pub fn optimize(text: &str) -> String {
    let spaced = normalize(text);
    let deduped = dedupe_lines(&spaced);
    normalize(&remove_hidden(&deduped))
}
