use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid vector '{0}'. Expected three comma-separated numbers (e.g., '0,0,1').")]
    InvalidVector(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),
}

/// Parses `x,y,z` into a vector, allowing spaces around the components.
pub fn parse_vector(s: &str) -> Result<[f64; 3], ParseError> {
    let invalid = || ParseError::InvalidVector(s.to_string());
    let components = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    let [x, y, z] = components[..] else {
        return Err(invalid());
    };
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return Err(invalid());
    }
    Ok([x, y, z])
}

/// Splits a `KEY=VALUE` override at the first `=`.
pub fn parse_key_value(s: &str) -> Result<(&str, &str), ParseError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidKeyValue(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_parse_with_optional_spaces() {
        assert_eq!(parse_vector("0,0,1"), Ok([0.0, 0.0, 1.0]));
        assert_eq!(parse_vector(" 1.5, -2 ,3e-1"), Ok([1.5, -2.0, 0.3]));
    }

    #[test]
    fn malformed_vectors_are_rejected() {
        for bad in ["", "1,2", "1,2,3,4", "a,b,c", "1,,3", "inf,0,0"] {
            assert_eq!(parse_vector(bad), Err(ParseError::InvalidVector(bad.to_string())));
        }
    }

    #[test]
    fn key_values_split_at_the_first_equals_sign() {
        assert_eq!(parse_key_value("pattern.path=a=b.csv"), Ok(("pattern.path", "a=b.csv")));
        assert_eq!(parse_key_value("seed = 4"), Ok(("seed", "4")));
        assert!(parse_key_value("seed").is_err());
        assert!(parse_key_value("=4").is_err());
    }
}
