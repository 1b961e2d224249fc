//! Serde helpers for partial-update payloads

use serde::{Deserialize, Deserializer};

/// Deserialize bool that treats null as true
pub fn bool_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(true))
}

/// Distinguish an omitted field from an explicit `null`.
///
/// Use together with `#[serde(default)]`:
/// - field omitted → `None` (keep the stored value)
/// - `null` → `Some(None)` (clear the stored value)
/// - value → `Some(Some(v))`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        parent_id: Option<Option<i64>>,
        #[serde(default = "yes", deserialize_with = "bool_true")]
        is_active: bool,
    }

    fn yes() -> bool {
        true
    }

    #[test]
    fn test_double_option_omitted() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.parent_id, None);
        assert!(patch.is_active);
    }

    #[test]
    fn test_double_option_null_clears() {
        let patch: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(patch.parent_id, Some(None));
    }

    #[test]
    fn test_double_option_value() {
        let patch: Patch = serde_json::from_str(r#"{"parent_id": 7}"#).unwrap();
        assert_eq!(patch.parent_id, Some(Some(7)));
    }

    #[test]
    fn test_bool_true_null() {
        let patch: Patch = serde_json::from_str(r#"{"is_active": null}"#).unwrap();
        assert!(patch.is_active);
        let patch: Patch = serde_json::from_str(r#"{"is_active": false}"#).unwrap();
        assert!(!patch.is_active);
    }
}
