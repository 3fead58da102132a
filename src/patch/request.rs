//! Apply request payload.
//!
//! ```json
//! {
//!   "projectDir": "/path/to/app",
//!   "configs": [
//!     { "componentName": "Card",
//!       "elements": [{ "name": "Title", "relativeSizeValue": 3, "path": "Card.tsx:4" }] }
//!   ],
//!   "fieldNames": ["getTextScaleClass", "mapLevelToPx"]
//! }
//! ```
//!
//! Scan output can be fed back directly: extra element fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

use crate::marker::parse_signed;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,
    pub configs: Vec<ComponentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub component_name: String,
    pub elements: Vec<ElementConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementConfig {
    pub name: String,
    #[serde(deserialize_with = "de_size")]
    pub relative_size_value: i32,
    #[serde(default)]
    pub path: String,
}

impl ApplyRequest {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Number of elements across all components.
    pub fn element_count(&self) -> usize {
        self.configs.iter().map(|c| c.elements.len()).sum()
    }
}

/// Accept `3`, `-1`, `"+2"` and `"-1"`.
fn de_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => parse_signed(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid relative size `{text}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let json = r#"{
            "projectDir": "~/app",
            "configs": [{
                "componentName": "Card",
                "elements": [
                    {"name": "Title", "relativeSizeValue": 3, "path": "Card.tsx:4"},
                    {"id": "card-2", "name": "Body", "relativeSizeValue": "-1", "path": "Card.tsx:9", "matchType": "comment"}
                ]
            }]
        }"#;
        let request = ApplyRequest::from_json(json).unwrap();
        assert_eq!(request.project_dir.as_deref(), Some("~/app"));
        assert_eq!(request.element_count(), 2);
        assert_eq!(request.configs[0].elements[1].relative_size_value, -1);
        assert!(request.field_names.is_none());
    }

    #[test]
    fn test_invalid_size() {
        let json = r#"{"configs":[{"componentName":"C","elements":[{"name":"T","relativeSizeValue":"big"}]}]}"#;
        assert!(ApplyRequest::from_json(json).is_err());
    }
}
