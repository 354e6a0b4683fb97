//! Word frequencies for the keyword cloud.
//!
//! The keyword list is treated as a corpus: keywords are joined, tokenized
//! and counted, so a keyword repeated by the evaluator weighs more.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w'+#]*").unwrap());

/// Filler words that never carry a skill on their own.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "in",
    "into", "is", "it", "its", "of", "on", "or", "that", "the", "their", "this", "to", "was",
    "were", "will", "with",
];

#[derive(Debug, Clone, PartialEq)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// `count` divided by the highest count.
    pub weight: f64,
}

#[derive(Debug)]
struct WordGroup {
    first_seen: usize,
    total: usize,
    /// Casing variants with their counts, in order of first appearance.
    casings: Vec<(String, usize)>,
}

impl WordGroup {
    fn add(&mut self, token: &str) {
        self.total += 1;
        match self.casings.iter_mut().find(|(c, _)| c == token) {
            Some((_, n)) => *n += 1,
            None => self.casings.push((token.to_string(), 1)),
        }
    }

    fn absorb(&mut self, other: WordGroup) {
        self.first_seen = self.first_seen.min(other.first_seen);
        self.total += other.total;
    }

    /// Most frequent casing; earliest wins ties.
    fn display(&self) -> &str {
        let mut best: Option<&(String, usize)> = None;
        for casing in &self.casings {
            if best.map(|b| casing.1 > b.1).unwrap_or(true) {
                best = Some(casing);
            }
        }
        best.map(|(c, _)| c.as_str()).unwrap_or_default()
    }
}

/// Counts words across the keyword list and returns the `max_words` most
/// frequent, highest first. Ties keep first-appearance order.
pub fn word_frequencies(keywords: &[String], max_words: usize) -> Vec<WordFrequency> {
    let corpus = keywords.join(" ");
    let mut groups: HashMap<String, WordGroup> = HashMap::new();

    for (position, m) in TOKEN_RE.find_iter(&corpus).enumerate() {
        let token = strip_possessive(m.as_str());
        let key = token.to_lowercase();
        if token.is_empty() || STOPWORDS.contains(&key.as_str()) || is_number(token) {
            continue;
        }
        groups
            .entry(key)
            .or_insert_with(|| WordGroup {
                first_seen: position,
                total: 0,
                casings: Vec::new(),
            })
            .add(token);
    }

    fold_plurals(&mut groups);

    let mut ranked: Vec<WordGroup> = groups.into_values().collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then(a.first_seen.cmp(&b.first_seen)));
    ranked.truncate(max_words);

    let max_count = ranked.first().map(|g| g.total).unwrap_or(1) as f64;
    ranked
        .iter()
        .map(|g| WordFrequency {
            word: g.display().to_string(),
            count: g.total,
            weight: g.total as f64 / max_count,
        })
        .collect()
}

/// Merges `apis` into `api` when both occur. `ss` endings are left alone.
fn fold_plurals(groups: &mut HashMap<String, WordGroup>) {
    let plurals: Vec<String> = groups
        .keys()
        .filter(|k| k.len() > 1 && k.ends_with('s') && !k.ends_with("ss"))
        .filter(|k| groups.contains_key(&k[..k.len() - 1]))
        .cloned()
        .collect();

    for plural in plurals {
        if let Some(group) = groups.remove(&plural) {
            if let Some(singular) = groups.get_mut(&plural[..plural.len() - 1]) {
                singular.absorb(group);
            }
        }
    }
}

fn strip_possessive(token: &str) -> &str {
    token
        .strip_suffix("'s")
        .or_else(|| token.strip_suffix("'S"))
        .unwrap_or(token)
}

fn is_number(token: &str) -> bool {
    token.chars().all(|c| c.is_numeric())
}
