use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(u64),
}

/// Reads an optional identifier the backend may send either as a string or as a number.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(id.map(|id| match id {
        StringOrNumber::Text(text) => text,
        StringOrNumber::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct TestStruct {
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        id: Option<String>,
    }

    #[test]
    fn test_deserialize_optional_id() {
        let number: TestStruct = serde_json::from_str(r#"{"id": 17}"#).unwrap();
        let text: TestStruct = serde_json::from_str(r#"{"id": "17"}"#).unwrap();
        let null: TestStruct = serde_json::from_str(r#"{"id": null}"#).unwrap();
        let missing: TestStruct = serde_json::from_str("{}").unwrap();

        assert_eq!(number.id.as_deref(), Some("17"));
        assert_eq!(text.id.as_deref(), Some("17"));
        assert_eq!(null.id, None);
        assert_eq!(missing.id, None);
    }
}
