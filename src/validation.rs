use crate::error::AppError;

/// Trims a required text field, rejecting it when nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank values collapse to `None`.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims every topic and rejects blank ones, keeping input order.
pub fn topics(values: &[String]) -> Result<Vec<String>, AppError> {
    values
        .iter()
        .enumerate()
        .map(|(i, t)| required(&format!("topics[{}]", i), t))
        .collect()
}

/// `#RRGGBB` colour.
pub fn color(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::BadRequest(format!("color must look like #RRGGBB, got {:?}", value)));
    }
    Ok(value.to_string())
}
