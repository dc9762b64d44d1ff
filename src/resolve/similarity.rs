//! Gestalt pattern matching (Ratcliff/Obershelp).
//!
//! The ratio is `2 * M / T`, where `T` is the total number of characters in
//! both strings and `M` the number of characters in matching blocks: the
//! longest common block, then recursively the longest blocks to its left and
//! right. Ties between equally long blocks go to the earliest position in
//! the first string, then the second.

use cinedex_common::TmdbId;

/// Ratio above which a candidate is accepted without looking further.
pub const SHORT_CIRCUIT_RATIO: f64 = 0.99;

/// Minimum ratio for a fuzzy match to count at all.
pub const MIN_RATIO: f64 = 0.85;

/// Similarity of two strings in `[0, 1]`, compared per `char`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_of(&a, &b)
}

fn ratio_of(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(a, b) as f64 / total as f64
}

/// Upper bound of [`ratio`] from the lengths alone.
fn length_bound(a: usize, b: usize) -> f64 {
    let total = a + b;
    if total == 0 {
        return 1.0;
    }
    2.0 * a.min(b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut lengths = vec![0usize; b.len() + 1];
    let mut next = vec![0usize; b.len() + 1];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_block(a, b, (alo, ahi, blo, bhi), &mut lengths, &mut next);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
fn longest_block(
    a: &[char],
    b: &[char],
    (alo, ahi, blo, bhi): (usize, usize, usize, usize),
    lengths: &mut [usize],
    next: &mut [usize],
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    lengths[blo..=bhi].fill(0);

    for i in alo..ahi {
        next[blo..=bhi].fill(0);
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = lengths[j] + 1;
                next[j + 1] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        lengths[blo..=bhi].copy_from_slice(&next[blo..=bhi]);
    }
    (best_i, best_j, best_k)
}

/// Pick the best cached title for `query`.
///
/// Candidates are scanned in order. The first one above
/// [`SHORT_CIRCUIT_RATIO`] wins immediately; otherwise the highest ratio of
/// at least [`MIN_RATIO`] wins, the earliest candidate on ties.
pub fn best_fuzzy_match<'a, I>(query: &str, candidates: I) -> Option<(TmdbId, f64)>
where
    I: IntoIterator<Item = (TmdbId, &'a str)>,
{
    let query: Vec<char> = query.chars().collect();
    let mut best: Option<(TmdbId, f64)> = None;
    let mut title = Vec::new();

    for (id, candidate) in candidates {
        title.clear();
        title.extend(candidate.chars());

        let bound = length_bound(query.len(), title.len());
        let beaten = best.is_some_and(|(_, b)| bound <= b);
        if bound < MIN_RATIO || (beaten && bound <= SHORT_CIRCUIT_RATIO) {
            continue;
        }

        let r = ratio_of(&query, &title);
        if r > SHORT_CIRCUIT_RATIO {
            return Some((id, r));
        }
        if r >= MIN_RATIO && best.map_or(true, |(_, b)| r > b) {
            best = Some((id, r));
        }
    }
    best
}
