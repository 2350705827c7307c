use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RatingError {
    #[error("Rating must not be null")]
    Null,
    #[error("Rating must be a number or a string, got {0}")]
    WrongType(&'static str),
    #[error("Rating {0} does not fit into an integer")]
    OutOfRange(String),
    #[error("Rating {0:?} is not an integer")]
    NotAnInteger(String),
}

/// Converts a JSON value into an integer rating.
///
/// Integers are taken as is, booleans become 1 or 0, floats are truncated toward zero and strings
/// must hold a base 10 integer, optionally surrounded by whitespace.
pub fn parse_rating(value: &Value) -> Result<i64, RatingError> {
    match value {
        Value::Null => Err(RatingError::Null),
        Value::Bool(flag) => Ok(i64::from(*flag)),
        Value::Array(_) => Err(RatingError::WrongType("an array")),
        Value::Object(_) => Err(RatingError::WrongType("an object")),
        Value::Number(number) => {
            if let Some(rating) = number.as_i64() {
                return Ok(rating);
            }

            match number.as_f64() {
                // i64::MIN is exactly representable, i64::MAX rounds up to 2^63.
                Some(float)
                    if float.is_finite()
                        && float >= i64::MIN as f64
                        && float < i64::MAX as f64 =>
                {
                    Ok(float.trunc() as i64)
                }
                _ => Err(RatingError::OutOfRange(number.to_string())),
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| RatingError::NotAnInteger(text.clone())),
    }
}
