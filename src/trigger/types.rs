//! Trigger and parameter declarations

use serde::{Deserialize, Serialize};

/// Declared type of a template parameter.
///
/// Documentation only: values are never checked against it at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Url,
    Datetime,
    Array,
}

/// A placeholder a trigger's templates may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Placeholder key, referenced in templates as `{{.Name}}`
    pub name: String,

    #[serde(rename = "type", default)]
    pub param_type: ParamType,

    #[serde(default)]
    pub description: String,

    /// Advisory only
    #[serde(default)]
    pub required: bool,

    /// Example value used for previews and test sends
    #[serde(default)]
    pub example: String,
}

impl Param {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: String::new(),
            required: false,
            example: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    /// The literal placeholder text for this parameter, e.g. `{{.UserName}}`.
    pub fn placeholder(&self) -> String {
        format!("{{{{.{}}}}}", self.name)
    }
}

/// An application event that may cause an email to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub code: String,
    pub name: String,
    pub description: String,
    pub params: Vec<Param>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_text() {
        let param = Param::new("NoExample", ParamType::String);
        assert_eq!(param.placeholder(), "{{.NoExample}}");
    }

    #[test]
    fn test_param_serializes_type_field() {
        let param = Param::new("ResetURL", ParamType::Url)
            .required()
            .example("https://example.com/reset");
        let json = serde_json::to_value(&param).unwrap();

        assert_eq!(json["type"], "url");
        assert_eq!(json["required"], true);
        assert_eq!(json["example"], "https://example.com/reset");
    }

    #[test]
    fn test_param_deserialize_defaults() {
        let param: Param = serde_json::from_str(r#"{"name": "UserName"}"#).unwrap();
        assert_eq!(param.param_type, ParamType::String);
        assert!(!param.required);
        assert!(param.example.is_empty());
    }
}
