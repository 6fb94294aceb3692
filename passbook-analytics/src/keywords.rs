//! Narration keyword frequency.
//!
//! Words are split on non-word characters and upper-cased. Output is sorted
//! by count, highest first; equal counts keep first-occurrence order.

use passbook_core::Transaction;
use std::collections::HashMap;

/// Count narration words of the money-moving rows.
pub fn keyword_frequency(transactions: &[Transaction], min_len: usize) -> Vec<(String, usize)> {
    count_words(
        transactions
            .iter()
            .filter(|t| t.is_normal())
            .map(|t| t.narration.as_str()),
        min_len,
    )
}

/// Count words across free-form texts.
pub fn count_words<'a>(texts: impl IntoIterator<Item = &'a str>, min_len: usize) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for word in text.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if word.chars().count() < min_len {
                continue;
            }
            let word = word.to_uppercase();
            match index.get(&word) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(word.clone(), order.len());
                    order.push((word, 1));
                }
            }
        }
    }

    // Stable sort: ties stay in first-seen order.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

/// Keep keywords seen at least `min_count` times, optionally capped.
pub fn frequent(counts: &[(String, usize)], min_count: usize, limit: Option<usize>) -> Vec<(String, usize)> {
    counts
        .iter()
        .filter(|(_, n)| *n >= min_count)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}
