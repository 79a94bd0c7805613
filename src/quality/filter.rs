//! Rationale-corroboration filtering.
//!
//! The threshold is not a fixed cutoff: for each item it is the highest
//! pairwise similarity any two rationales reached. Only judgments taking
//! part in a pair at that peak survive.

use super::similarity::similarity;
use crate::models::JudgmentInput;

/// Similarity of the rationales at positions `i < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PairScore {
    i: usize,
    j: usize,
    score: f64,
}

/// Judgments that passed the filter, in original relative order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredJudgments {
    pub threshold: f64,
    /// Original positions of the retained judgments.
    pub indices: Vec<usize>,
    pub scores: Vec<f64>,
    pub rationales: Vec<String>,
}

impl FilteredJudgments {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Maximum similarity over the given rationale pairs; `0.0` if there are none.
pub fn select_threshold<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    peak(pairs.into_iter().map(|(a, b)| similarity(a, b)))
}

fn peak(scores: impl IntoIterator<Item = f64>) -> f64 {
    scores.into_iter().fold(0.0, f64::max)
}

/// Keeps the judgments whose rationale reaches the item's peak similarity
/// with at least one other judgment.
///
/// Identity is positional: two workers submitting the same rationale text
/// are retained (or dropped) independently. Fewer than two inputs form no
/// pair and yield an empty result.
pub fn filter_by_threshold(inputs: &[JudgmentInput]) -> FilteredJudgments {
    let pairs = pairwise_scores(inputs);
    let threshold = peak(pairs.iter().map(|p| p.score));

    let mut included = vec![false; inputs.len()];
    for pair in &pairs {
        if pair.score >= threshold {
            included[pair.i] = true;
            included[pair.j] = true;
        }
    }

    let mut filtered = FilteredJudgments {
        threshold,
        ..FilteredJudgments::default()
    };
    for (idx, input) in inputs.iter().enumerate() {
        if included[idx] {
            filtered.indices.push(idx);
            filtered.scores.push(input.score());
            filtered.rationales.push(input.rationale().to_string());
        }
    }
    filtered
}

fn pairwise_scores(inputs: &[JudgmentInput]) -> Vec<PairScore> {
    let n = inputs.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(PairScore {
                i,
                j,
                score: similarity(inputs[i].rationale(), inputs[j].rationale()),
            });
        }
    }
    pairs
}
