//! Keyword hints from a user's own bug titles.
//!
//! Titles are lowercased and split on spaces; words longer than three
//! characters are counted, and any word seen more than twice becomes a hint.
//! At most three hints are returned, in the order their words first appeared.

use crate::domain::Bug;
use serde::Serialize;
use std::collections::HashMap;

const MIN_WORD_LENGTH: usize = 4;
const MIN_OCCURRENCES: usize = 3;
const MAX_SUGGESTIONS: usize = 3;

/// A recurring title keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// The recurring word
    pub keyword: String,

    /// How many times it appeared
    pub occurrences: usize,
}

impl Suggestion {
    /// Text shown to the user
    pub fn message(&self) -> String {
        format!(
            "You've reported several bugs related to \"{}\", consider reviewing that area.",
            self.keyword
        )
    }
}

/// Recurring keywords across `bugs`' titles, first-seen first.
pub fn keyword_suggestions<'a>(bugs: impl IntoIterator<Item = &'a Bug>) -> Vec<Suggestion> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut seen = 0;

    for bug in bugs {
        for word in bug.title.to_lowercase().split(' ') {
            if word.chars().count() < MIN_WORD_LENGTH {
                continue;
            }
            let slot = counts.entry(word.to_string()).or_insert_with(|| {
                seen += 1;
                (0, seen)
            });
            slot.0 += 1;
        }
    }

    let mut frequent: Vec<(String, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= MIN_OCCURRENCES)
        .map(|(word, (count, order))| (word, count, order))
        .collect();
    frequent.sort_by_key(|(_, _, order)| *order);

    frequent
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(keyword, occurrences, _)| Suggestion {
            keyword,
            occurrences,
        })
        .collect()
}
