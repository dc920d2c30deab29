use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Query-string friendly optional UUID: treats an empty string as absent.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Query-string friendly optional bool: accepts "true"/"false", empty is absent.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<bool>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        active: Option<bool>,
    }

    #[test]
    fn test_empty_strings_are_none() {
        let p: Params = serde_json::from_str(r#"{"id":"","active":""}"#).unwrap();
        assert_eq!(p.id, None);
        assert_eq!(p.active, None);
    }

    #[test]
    fn test_values_parse() {
        let id = Uuid::new_v4();
        let p: Params =
            serde_json::from_str(&format!(r#"{{"id":"{id}","active":"true"}}"#)).unwrap();
        assert_eq!(p.id, Some(id));
        assert_eq!(p.active, Some(true));
    }
}
