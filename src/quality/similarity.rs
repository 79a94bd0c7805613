//! Ratcliff/Obershelp similarity between rationales.
//!
//! The matcher recursively takes the longest common block, then repeats on
//! the unmatched text to its left and right. Space, tab and newline are
//! junk on the second sequence: they never seed a block but a block may
//! grow across them. That asymmetry makes the raw ratio order-dependent,
//! so [`similarity`] takes the better of both orderings.

use std::collections::HashMap;

/// Symmetric similarity of two rationales in `[0, 1]`.
///
/// Two empty strings are identical (`1.0`); an empty string shares
/// nothing with a non-empty one (`0.0`).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio(&a, &b).max(ratio(&b, &a))
}

fn is_junk(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// One-directional ratio `2·M / (|a| + |b|)` with junk taken from `b`.
fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(a, b).matched_chars();
    2.0 * matched as f64 / total as f64
}

/// A maximal common block: `a[a_start..a_start + len] == b[b_start..b_start + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    len: usize,
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions in `b` of every non-junk character.
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            if !is_junk(c) {
                b_index.entry(c).or_default().push(j);
            }
        }
        Self { a, b, b_index }
    }

    /// Total length of all matching blocks.
    fn matched_chars(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if block.len == 0 {
                continue;
            }
            matched += block.len;
            if a_lo < block.a_start && b_lo < block.b_start {
                pending.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let a_end = block.a_start + block.len;
            let b_end = block.b_start + block.len;
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
        }

        matched
    }

    /// Longest junk-free block in the window, extended over adjacent equal
    /// junk. Ties go to the block starting earliest in `a`, then in `b`.
    fn longest_match(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Block {
        let (a, b) = (self.a, self.b);
        let mut best = Block {
            a_start: a_lo,
            b_start: b_lo,
            len: 0,
        };

        // run_len[j] = length of the common suffix ending at a[i - 1], b[j]
        let mut run_len: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next_run: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_index.get(&a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run.insert(j, k);
                    if k > best.len {
                        best = Block {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            len: k,
                        };
                    }
                }
            }
            run_len = next_run;
        }

        for junk_pass in [false, true] {
            while best.a_start > a_lo
                && best.b_start > b_lo
                && is_junk(b[best.b_start - 1]) == junk_pass
                && a[best.a_start - 1] == b[best.b_start - 1]
            {
                best.a_start -= 1;
                best.b_start -= 1;
                best.len += 1;
            }
            while best.a_start + best.len < a_hi
                && best.b_start + best.len < b_hi
                && is_junk(b[best.b_start + best.len]) == junk_pass
                && a[best.a_start + best.len] == b[best.b_start + best.len]
            {
                best.len += 1;
            }
        }

        best
    }
}
