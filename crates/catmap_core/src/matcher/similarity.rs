//! Character-level similarity ratio.
//!
//! `ratio(a, b) = 2 * LCS(a, b) / (|a| + |b|)` over Unicode scalar values,
//! i.e. one minus the normalized insert/delete edit distance.
//!
//! - Range `[0.0, 1.0]`; `1.0` only for identical strings.
//! - Symmetric.
//! - Two empty strings are identical (`1.0`).

/// Normalized alignment ratio between two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }
    let common = longest_common_subsequence(&a_chars, &b_chars);
    (2 * common) as f64 / total as f64
}

/// Length of the longest common subsequence (two-row DP).
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Keep the shorter sequence on the row axis.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev_row = vec![0usize; inner.len() + 1];
    let mut curr_row = vec![0usize; inner.len() + 1];
    for &outer_char in outer {
        for (j, &inner_char) in inner.iter().enumerate() {
            curr_row[j + 1] = if outer_char == inner_char {
                prev_row[j] + 1
            } else {
                curr_row[j].max(prev_row[j + 1])
            };
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[inner.len()]
}

#[cfg(test)]
mod tests {
    use super::ratio;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn identity_is_one() {
        assert_close(ratio("양수냄비", "양수냄비"), 1.0);
        assert_close(ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_or_empty_side_is_zero() {
        assert_close(ratio("abc", "xyz"), 0.0);
        assert_close(ratio("abc", ""), 0.0);
    }

    #[test]
    fn pinned_reference_values() {
        assert_close(ratio("abcd", "abce"), 0.75);
        assert_close(ratio("kitten", "sitting"), 8.0 / 13.0);
        assert_close(ratio("양수냄비", "편수냄비"), 0.75);
        assert_close(ratio("냄비", "양수냄비"), 4.0 / 6.0);
        assert_close(ratio("스텐양수냄비", "양수냄비"), 0.8);
    }

    #[test]
    fn symmetric() {
        for (a, b) in [("kitten", "sitting"), ("냄비", "양수냄비"), ("ab", "ba")] {
            assert_close(ratio(a, b), ratio(b, a));
        }
    }

    #[test]
    fn decreases_as_edits_accumulate() {
        let base = "abcdefgh";
        let one_edit = ratio(base, "abcdefgx");
        let two_edits = ratio(base, "abcdefxx");
        let three_edits = ratio(base, "abcdexxx");
        assert!(1.0 > one_edit);
        assert!(one_edit > two_edits);
        assert!(two_edits > three_edits);
    }
}
