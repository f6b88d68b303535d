//! Approximate string matching.
//!
//! Similarity is the Ratcliff/Obershelp ratio: twice the number of characters
//! in matching blocks divided by the combined length. Blocks are found by
//! taking the longest common run and recursing on both sides of it.

/// Similarity of two strings in `[0.0, 1.0]`. Case-sensitive.
///
/// Computed in both directions and the larger ratio kept, so the result does
/// not depend on argument order.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b).max(matching_characters(&b, &a));
    2.0 * matched as f64 / total as f64
}

/// Cheap ceiling on [`similarity_ratio`] from the lengths alone.
pub fn ratio_upper_bound(a_len: usize, b_len: usize) -> f64 {
    let total = a_len + b_len;
    if total == 0 {
        return 1.0;
    }
    2.0 * a_len.min(b_len) as f64 / total as f64
}

/// Case-insensitive match: `needle` occurs in `haystack`, or the two are more
/// similar than `threshold`.
pub fn is_fuzzy_match(needle: &str, haystack: &str, threshold: f64) -> bool {
    let needle = needle.to_lowercase();
    let haystack = haystack.to_lowercase();

    if haystack.contains(&needle) {
        return true;
    }

    let bound = ratio_upper_bound(needle.chars().count(), haystack.chars().count());
    if bound <= threshold {
        return false;
    }

    similarity_ratio(&needle, &haystack) > threshold
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_common_block(a, b, (alo, ahi), (blo, bhi));
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

/// Longest run shared by `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
/// Ties go to the earliest start in `a`, then in `b`.
fn longest_common_block(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);

    // run[c + 1]: length of the common suffix ending at a[i] and b[blo + c]
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut run = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            run[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            if run[col] > best_len {
                best_len = run[col];
                best_i = i + 1 - best_len;
                best_j = j + 1 - best_len;
            }
        }
        std::mem::swap(&mut prev, &mut run);
    }

    (best_i, best_j, best_len)
}
