//! Fuzzy author-name matching.
//!
//! Scores are on a 0-100 scale. A candidate's score is the best of a plain
//! edit-distance ratio and two token-based ratios (sorted tokens, token
//! sets), the token variants discounted slightly so an exact string still
//! ranks first. Token scoring absorbs reordered names ("Tan Wei Ling" vs
//! "Wei Ling Tan") and extra middle names.

use std::collections::BTreeSet;

use crate::error::{Result, ScienceError};

const TOKEN_SCALE: f64 = 0.95;

fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sort = |s: &str| {
        let mut tokens = s.split_whitespace().collect::<Vec<_>>();
        tokens.sort_unstable();
        tokens.join(" ")
    };
    ratio(&sort(a), &sort(b))
}

fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left = a.split_whitespace().collect::<BTreeSet<_>>();
    let right = b.split_whitespace().collect::<BTreeSet<_>>();

    let join = |tokens: Vec<&str>| tokens.join(" ");
    let common = join(left.intersection(&right).copied().collect());
    let only_left = join(left.difference(&right).copied().collect());
    let only_right = join(right.difference(&left).copied().collect());

    let combine = |diff: &str| match (common.is_empty(), diff.is_empty()) {
        (true, _) => diff.to_string(),
        (false, true) => common.clone(),
        (false, false) => format!("{common} {diff}"),
    };
    let with_left = combine(&only_left);
    let with_right = combine(&only_right);

    ratio(&common, &with_left)
        .max(ratio(&common, &with_right))
        .max(ratio(&with_left, &with_right))
}

/// Similarity of two names, 0-100.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    ratio(&a, &b)
        .max(token_sort_ratio(&a, &b) * TOKEN_SCALE)
        .max(token_set_ratio(&a, &b) * TOKEN_SCALE)
}

/// Index of the best-scoring candidate. Ties go to the earliest candidate.
///
/// No minimum score is applied. An empty candidate list is a caller bug.
pub fn most_similar_index<S: AsRef<str>>(target: &str, candidates: &[S]) -> Result<usize> {
    best_match(target, candidates).map(|(index, _)| index)
}

fn best_match<S: AsRef<str>>(target: &str, candidates: &[S]) -> Result<(usize, f64)> {
    if candidates.is_empty() {
        return Err(ScienceError::InvalidInput(format!(
            "no candidate names to match against {target:?}"
        )));
    }

    let mut best = (0, f64::MIN);
    for (index, candidate) in candidates.iter().enumerate() {
        let score = name_similarity(target, candidate.as_ref());
        if score > best.1 {
            best = (index, score);
        }
    }
    Ok(best)
}

/// Name matcher with an optional minimum score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatcher {
    threshold: Option<f64>,
}

impl NameMatcher {
    pub fn new(threshold: Option<f64>) -> Self {
        Self { threshold }
    }

    /// Like [`most_similar_index`], but `None` when the best score is under
    /// the configured threshold.
    pub fn best_index<S: AsRef<str>>(
        &self,
        target: &str,
        candidates: &[S],
    ) -> Result<Option<usize>> {
        let (index, score) = best_match(target, candidates)?;
        match self.threshold {
            Some(min) if score < min => {
                tracing::debug!(
                    target_name = target,
                    score,
                    min,
                    "best name match below threshold"
                );
                Ok(None)
            }
            _ => Ok(Some(index)),
        }
    }
}
