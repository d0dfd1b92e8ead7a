//! Declaration of the single tool the model may call.

use crate::resolution::ResolutionCategory;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the resolution-commit tool as exposed to the model.
pub const SAVE_RESOLUTION_TOOL: &str = "saveResolution";

/// Argument keys of `saveResolution`, in declaration order.
pub const SAVE_RESOLUTION_FIELDS: [&str; 4] = ["title", "category", "motivation", "firstStep"];

/// A callable operation the model service is permitted to invoke.
///
/// `parameters` is a JSON-schema-like object (type, properties, required).
/// A declaration is built once per session and sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDeclaration {
    /// The `saveResolution` contract: four required strings, `category`
    /// restricted to the resolution category wire names.
    pub fn save_resolution() -> Self {
        Self {
            name: SAVE_RESOLUTION_TOOL.to_string(),
            description: "Saves a finalized New Year resolution to the user's board. \
                Call this when the user has agreed on a specific resolution, its motivation, \
                and a first step."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "A concise title for the resolution (e.g., \"Run a Marathon\")."
                    },
                    "category": {
                        "type": "string",
                        "enum": ResolutionCategory::wire_names(),
                        "description": "The category this resolution falls into."
                    },
                    "motivation": {
                        "type": "string",
                        "description": "The user's core \"why\" or motivation for this goal."
                    },
                    "firstStep": {
                        "type": "string",
                        "description": "The immediate first action step the user will take."
                    }
                },
                "required": SAVE_RESOLUTION_FIELDS,
            }),
        }
    }

    /// Names listed under `required` in the parameter schema.
    pub fn required_fields(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Allowed values for an enumerated string property, if it has any.
    pub fn enum_values(&self, property: &str) -> Option<Vec<&str>> {
        self.parameters
            .get("properties")?
            .get(property)?
            .get("enum")?
            .as_array()
            .map(|values| values.iter().filter_map(Value::as_str).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_resolution_requires_all_fields() {
        let tool = ToolDeclaration::save_resolution();
        assert_eq!(tool.name, "saveResolution");
        assert_eq!(
            tool.required_fields(),
            vec!["title", "category", "motivation", "firstStep"]
        );
    }

    #[test]
    fn test_category_enum_matches_domain() {
        let tool = ToolDeclaration::save_resolution();
        assert_eq!(
            tool.enum_values("category"),
            Some(ResolutionCategory::wire_names())
        );
        assert_eq!(tool.enum_values("title"), None);
    }

    #[test]
    fn test_every_property_is_a_string() {
        let tool = ToolDeclaration::save_resolution();
        let properties = tool.parameters["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 4);
        assert!(properties.values().all(|p| p["type"] == "string"));
    }
}
