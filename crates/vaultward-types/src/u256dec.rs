//! Serde helpers for `U256` fields carried as decimal strings.
//!
//! Every amount that crosses the decision-service boundary is stringified in
//! base 10 so no precision is lost in JSON number handling.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.as_bytes().iter().all(|b| b.is_ascii_digit()) {
        return Err(serde::de::Error::custom(format!(
            "expected a decimal integer string, got {raw:?}"
        )));
    }
    U256::from_str(trimmed).map_err(serde::de::Error::custom)
}

/// Same convention for `Vec<U256>` fields (e.g. partition vectors).
pub mod vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|entry| {
                let trimmed = entry.trim();
                if trimmed.is_empty() || !trimmed.as_bytes().iter().all(|b| b.is_ascii_digit()) {
                    return Err(serde::de::Error::custom(format!(
                        "expected a decimal integer string, got {entry:?}"
                    )));
                }
                U256::from_str(trimmed).map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
