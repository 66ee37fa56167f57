//! Allow-list validation for dataset parameters.
//!
//! Validation is a plain function call made before any I/O. A value that is not in the
//! allow-list is rejected as-is; nothing is trimmed, lower-cased or otherwise corrected.

use crate::dataset::DatasetError;
use std::collections::HashSet;

/// Fixed, ordered set of accepted values for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    values: Vec<String>,
}

impl AllowList {
    /// Builds an allow-list, keeping the given order.
    ///
    /// # Errors
    /// Returns [`DatasetError::DuplicateAllowed`] if a value appears twice.
    pub fn new<I, S>(values: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(values.len());
        for value in &values {
            if !seen.insert(value.as_str()) {
                return Err(DatasetError::DuplicateAllowed(value.clone()));
            }
        }
        Ok(Self { values })
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Checks `value` against `allowed` for the named field and hands it back unchanged.
///
/// ```rust
/// use metsource::normalize::{normalize, AllowList};
///
/// let allowed = AllowList::new(["soil_temperature", "forecast_error"]).unwrap();
/// assert_eq!(normalize("parameter", "forecast_error", &allowed).unwrap(), "forecast_error");
/// assert!(normalize("parameter", "wind_speed", &allowed).is_err());
/// ```
pub fn normalize<'v>(
    field: &str,
    value: &'v str,
    allowed: &AllowList,
) -> Result<&'v str, DatasetError> {
    if allowed.contains(value) {
        Ok(value)
    } else {
        Err(DatasetError::InvalidParameter {
            field: field.to_string(),
            value: value.to_string(),
            accepted: allowed.as_slice().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast_fields() -> AllowList {
        AllowList::new(["soil_temperature", "forecast_error"]).unwrap()
    }

    #[test]
    fn test_every_member_is_accepted() {
        let allowed = forecast_fields();
        for value in allowed.iter() {
            assert_eq!(normalize("parameter", value, &allowed).unwrap(), value);
        }
    }

    #[test]
    fn test_non_member_is_rejected_with_context() {
        let allowed = forecast_fields();
        match normalize("parameter", "wind_speed", &allowed) {
            Err(DatasetError::InvalidParameter {
                field,
                value,
                accepted,
            }) => {
                assert_eq!(field, "parameter");
                assert_eq!(value, "wind_speed");
                assert_eq!(accepted, vec!["soil_temperature", "forecast_error"]);
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_matching_is_exact() {
        let allowed = forecast_fields();
        assert!(normalize("parameter", "Forecast_Error", &allowed).is_err());
        assert!(normalize("parameter", " forecast_error", &allowed).is_err());
        assert!(normalize("parameter", "", &allowed).is_err());
    }

    #[test]
    fn test_error_message_lists_accepted_values() {
        let allowed = forecast_fields();
        let err = normalize("parameter", "wind_speed", &allowed).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("wind_speed"));
        assert!(message.contains("soil_temperature, forecast_error"));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let result = AllowList::new(["forecast_error", "soil_temperature", "forecast_error"]);
        assert!(matches!(
            result,
            Err(DatasetError::DuplicateAllowed(ref v)) if v == "forecast_error"
        ));
    }

    #[test]
    fn test_order_is_preserved() {
        let allowed = AllowList::new(["b", "a", "c"]).unwrap();
        assert_eq!(allowed.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(allowed.len(), 3);
        assert!(!allowed.is_empty());
    }
}
