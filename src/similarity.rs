//! Normalized edit-distance similarity between two strings.
//! Utility for dedupe heuristics over revisable recognizer hypotheses;
//! not wired into the primary pipeline.

/// Similarity in `[0.0, 1.0]`: `1 - levenshtein(a, b) / max(len)`.
/// Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let longest = a_chars.len().max(b_chars.len());
    if longest == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a_chars, &b_chars);
    1.0 - distance as f64 / longest as f64
}

/// Single-character insert/delete/substitute Levenshtein distance.
/// Full DP matrix; inputs are short interim hypotheses, no early exit needed.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut matrix = vec![vec![0usize; a.len() + 1]; b.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=a.len() {
        matrix[0][j] = j;
    }

    for i in 1..=b.len() {
        for j in 1..=a.len() {
            if b[i - 1] == a[j - 1] {
                matrix[i][j] = matrix[i - 1][j - 1];
            } else {
                matrix[i][j] = (matrix[i - 1][j - 1])
                    .min(matrix[i][j - 1])
                    .min(matrix[i - 1][j])
                    + 1;
            }
        }
    }

    matrix[b.len()][a.len()]
}
