//! Wire-format helpers for the database's native VECTOR(D) column type.

/// Serialize a dense float vector into the textual `[f1,f2,...,fD]` form
/// CockroachDB accepts for string-bound VECTOR literals.
pub fn to_literal(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 8 + 2);
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Parse a `[f1,f2,...,fD]` literal back into a dense float vector.
///
/// Used by tests and by the `search` subcommand's distance reporting; not
/// required on the write path but kept alongside `to_literal` since both
/// sides of the wire format belong together.
pub fn from_literal(literal: &str) -> Option<Vec<f32>> {
    let trimmed = literal.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() {
        return Some(Vec::new());
    }
    inner
        .split(',')
        .map(|s| s.trim().parse::<f32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_literal_basic() {
        assert_eq!(to_literal(&[1.0, -2.5, 0.0]), "[1,-2.5,0]");
    }

    #[test]
    fn test_to_literal_empty() {
        assert_eq!(to_literal(&[]), "[]");
    }

    #[test]
    fn test_round_trip() {
        let values = vec![0.125f32, -3.5, 42.0];
        let literal = to_literal(&values);
        let parsed = from_literal(&literal).unwrap();
        assert_eq!(parsed, values);
    }

    #[test]
    fn test_from_literal_rejects_missing_brackets() {
        assert!(from_literal("1,2,3").is_none());
    }
}
