//! Parser for string-encoded 3-component vectors: `Vector3(x, y, z)`.

use thiserror::Error;

pub const VECTOR3_PREFIX: &str = "Vector3(";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorParseError {
    #[error("missing 'Vector3(' prefix")]
    MissingPrefix,
    #[error("missing closing ')'")]
    MissingClose,
    #[error("expected 3 components, found {0}")]
    WrongArity(usize),
    #[error("invalid component '{0}'")]
    InvalidComponent(String),
}

/// Parse `Vector3(x, y, z)` into `[x, y, z]`.
///
/// Whitespace around components and around the whole string is ignored.
/// Components use locale-independent float syntax and must be finite.
///
/// # Errors
/// Returns the first structural or numeric problem found.
pub fn parse_vector3(s: &str) -> Result<[f64; 3], VectorParseError> {
    let body = s.trim().strip_prefix(VECTOR3_PREFIX).ok_or(VectorParseError::MissingPrefix)?;
    let body = body.strip_suffix(')').ok_or(VectorParseError::MissingClose)?;

    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() != 3 {
        return Err(VectorParseError::WrongArity(parts.len()));
    }
    let mut out = [0.0f64; 3];
    for (slot, raw) in out.iter_mut().zip(parts) {
        let raw = raw.trim();
        *slot = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| VectorParseError::InvalidComponent(raw.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_spacing() {
        assert_eq!(parse_vector3("Vector3(1.5, -2, 3.25)").unwrap(), [1.5, -2.0, 3.25]);
        assert_eq!(parse_vector3("  Vector3(0,0 ,  1e3 ) ").unwrap(), [0.0, 0.0, 1000.0]);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse_vector3("(1,2,3)"), Err(VectorParseError::MissingPrefix));
        assert_eq!(parse_vector3("Vector3(1,2,3"), Err(VectorParseError::MissingClose));
        assert_eq!(parse_vector3("Vector3(1 2 3)"), Err(VectorParseError::WrongArity(1)));
        assert_eq!(parse_vector3("Vector3(1,2,3,4)"), Err(VectorParseError::WrongArity(4)));
        assert_eq!(parse_vector3("Vector3(1,x,3)"), Err(VectorParseError::InvalidComponent("x".into())));
        assert!(parse_vector3("Vector3(1,inf,3)").is_err());
        assert!(parse_vector3("Vector3(1,,3)").is_err());
    }

    #[test]
    fn decimal_comma_is_not_a_decimal_separator() {
        // "1,5" splits into components; it is never read as 1.5.
        assert_eq!(parse_vector3("Vector3(1,5, 2)").unwrap(), [1.0, 5.0, 2.0]);
        assert!(parse_vector3("Vector3(1,5, 2,0)").is_err());
    }
}
