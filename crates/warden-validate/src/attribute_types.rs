//! Value shapes of editable attribute types.
//!
//! Every editable attribute declares a `type`; the type decides what its
//! `value` may look like. Types without a shape (`hidden`, `file`) accept
//! any value.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Checkbox,
    CustomRepoConfiguration,
    CustomHugepages,
    File,
    Hidden,
    Number,
    Password,
    Radio,
    Select,
    Text,
    TextList,
    Textarea,
    TextareaList,
}

impl AttributeType {
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "checkbox" => AttributeType::Checkbox,
            "custom_repo_configuration" => AttributeType::CustomRepoConfiguration,
            "custom_hugepages" => AttributeType::CustomHugepages,
            "file" => AttributeType::File,
            "hidden" => AttributeType::Hidden,
            "number" => AttributeType::Number,
            "password" => AttributeType::Password,
            "radio" => AttributeType::Radio,
            "select" => AttributeType::Select,
            "text" => AttributeType::Text,
            "text_list" => AttributeType::TextList,
            "textarea" => AttributeType::Textarea,
            "textarea_list" => AttributeType::TextareaList,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::Checkbox => "checkbox",
            AttributeType::CustomRepoConfiguration => "custom_repo_configuration",
            AttributeType::CustomHugepages => "custom_hugepages",
            AttributeType::File => "file",
            AttributeType::Hidden => "hidden",
            AttributeType::Number => "number",
            AttributeType::Password => "password",
            AttributeType::Radio => "radio",
            AttributeType::Select => "select",
            AttributeType::Text => "text",
            AttributeType::TextList => "text_list",
            AttributeType::Textarea => "textarea",
            AttributeType::TextareaList => "textarea_list",
        }
    }

    /// Check `value` against this type's shape.
    pub fn check_value(&self, value: &Value) -> Result<(), String> {
        let ok = match self {
            AttributeType::File | AttributeType::Hidden => true,
            AttributeType::Checkbox => value.is_boolean(),
            AttributeType::Number => value.is_number(),
            AttributeType::Password
            | AttributeType::Radio
            | AttributeType::Select
            | AttributeType::Text
            | AttributeType::Textarea => value.is_string(),
            AttributeType::TextList | AttributeType::TextareaList => value
                .as_array()
                .is_some_and(|items| !items.is_empty() && items.iter().all(Value::is_string)),
            AttributeType::CustomHugepages => value
                .as_object()
                .is_some_and(|sizes| sizes.values().all(|v| v.is_i64() || v.is_u64())),
            AttributeType::CustomRepoConfiguration => {
                return check_repositories(value);
            }
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "{} is not a valid value for a '{}' attribute: expected {}",
                value,
                self.name(),
                self.expected()
            ))
        }
    }

    /// Check the option list of choice types.
    pub fn check_values(&self, values: Option<&Value>) -> Result<(), String> {
        if !matches!(self, AttributeType::Radio | AttributeType::Select) {
            return Ok(());
        }
        let Some(values) = values else {
            return Ok(());
        };
        let valid = values
            .as_array()
            .is_some_and(|options| !options.is_empty() && options.iter().all(is_option));
        if valid {
            Ok(())
        } else {
            Err(format!(
                "'values' of a '{}' attribute must be a non-empty list of options",
                self.name()
            ))
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            AttributeType::File | AttributeType::Hidden => "anything",
            AttributeType::Checkbox => "a boolean",
            AttributeType::Number => "a number",
            AttributeType::Password
            | AttributeType::Radio
            | AttributeType::Select
            | AttributeType::Text
            | AttributeType::Textarea => "a string",
            AttributeType::TextList | AttributeType::TextareaList => {
                "a non-empty list of strings"
            }
            AttributeType::CustomHugepages => "an object of integer page counts",
            AttributeType::CustomRepoConfiguration => "a non-empty list of repositories",
        }
    }
}

/// `{data, label, description, restrictions}` with string `data`, if present.
fn is_option(option: &Value) -> bool {
    let Some(option) = option.as_object() else {
        return false;
    };
    ["data", "label", "description"]
        .iter()
        .all(|key| option.get(*key).is_none_or(Value::is_string))
        && option.get("restrictions").is_none_or(Value::is_array)
}

fn check_repositories(value: &Value) -> Result<(), String> {
    let Some(repos) = value.as_array().filter(|r| !r.is_empty()) else {
        return Err(format!(
            "{value} is not a valid value for a 'custom_repo_configuration' attribute: expected a non-empty list of repositories"
        ));
    };
    for (index, repo) in repos.iter().enumerate() {
        let Some(repo) = repo.as_object() else {
            return Err(format!("repository #{index} must be an object"));
        };
        for key in ["name", "section", "suite", "type", "uri"] {
            if repo.get(key).is_some_and(|v| !v.is_string()) {
                return Err(format!("repository #{index}: '{key}' must be a string"));
            }
        }
        if repo
            .get("priority")
            .is_some_and(|p| !(p.is_null() || p.is_i64() || p.is_u64()))
        {
            return Err(format!("repository #{index}: 'priority' must be an integer or null"));
        }
    }
    Ok(())
}

/// Structural check of a single attribute definition.
///
/// Both `type` and `value` are required, `type` must be known, `weight`
/// is a non-negative integer and `restrictions` a list.
pub fn check_attribute(attr: &Map<String, Value>) -> Result<(), String> {
    let Some(type_value) = attr.get("type") else {
        return Err("'type' is a required property".to_string());
    };
    let Some(value) = attr.get("value") else {
        return Err("'value' is a required property".to_string());
    };
    let type_name = type_value
        .as_str()
        .ok_or_else(|| format!("{type_value} is not a valid attribute type"))?;
    let attr_type = AttributeType::from_name(type_name)
        .ok_or_else(|| format!("'{type_name}' is not a valid attribute type"))?;

    if attr.get("weight").is_some_and(|w| !w.is_u64()) {
        return Err("'weight' must be a non-negative integer".to_string());
    }
    if attr.get("restrictions").is_some_and(|r| !r.is_array()) {
        return Err("'restrictions' must be a list".to_string());
    }

    attr_type.check_value(value)?;
    attr_type.check_values(attr.get("values"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::object;
    use serde_json::json;

    #[test]
    fn names_round_trip() {
        for name in ["checkbox", "radio", "text_list", "custom_repo_configuration", "number"] {
            assert_eq!(AttributeType::from_name(name).unwrap().name(), name);
        }
        assert!(AttributeType::from_name("slider").is_none());
    }

    #[test]
    fn checkbox_needs_bool() {
        assert!(check_attribute(&object(json!({"type": "checkbox", "value": true}))).is_ok());
        let err = check_attribute(&object(json!({"type": "checkbox", "value": "yes"}))).unwrap_err();
        assert!(err.contains("expected a boolean"), "{err}");
    }

    #[test]
    fn type_and_value_required() {
        assert_eq!(
            check_attribute(&object(json!({"value": "x"}))).unwrap_err(),
            "'type' is a required property"
        );
        assert_eq!(
            check_attribute(&object(json!({"type": "text"}))).unwrap_err(),
            "'value' is a required property"
        );
    }

    #[test]
    fn unknown_type_rejected() {
        let err = check_attribute(&object(json!({"type": "slider", "value": 3}))).unwrap_err();
        assert_eq!(err, "'slider' is not a valid attribute type");
    }

    #[test]
    fn weight_and_restrictions_shapes() {
        let err = check_attribute(&object(json!({"type": "text", "value": "", "weight": -1}))).unwrap_err();
        assert!(err.contains("weight"));
        let err = check_attribute(&object(json!({"type": "text", "value": "", "restrictions": "x"}))).unwrap_err();
        assert!(err.contains("restrictions"));
        assert!(check_attribute(&object(json!({
            "type": "text",
            "value": "",
            "weight": 10,
            "restrictions": ["settings:common.debug.value == true"]
        })))
        .is_ok());
    }

    #[test]
    fn untyped_shapes_accept_anything() {
        assert!(check_attribute(&object(json!({"type": "hidden", "value": {"a": 1}}))).is_ok());
        assert!(check_attribute(&object(json!({"type": "file", "value": null}))).is_ok());
    }

    #[test]
    fn list_types() {
        assert!(check_attribute(&object(json!({"type": "text_list", "value": ["a"]}))).is_ok());
        assert!(check_attribute(&object(json!({"type": "text_list", "value": []}))).is_err());
        assert!(check_attribute(&object(json!({"type": "textarea_list", "value": ["a", 1]}))).is_err());
    }

    #[test]
    fn choice_types_check_options() {
        assert!(check_attribute(&object(json!({
            "type": "radio",
            "value": "image",
            "values": [{"data": "image", "label": "Image"}]
        })))
        .is_ok());
        assert!(check_attribute(&object(json!({"type": "select", "value": "a", "values": []}))).is_err());
        assert!(check_attribute(&object(json!({"type": "select", "value": "a", "values": [{"data": 1}]}))).is_err());
        assert!(check_attribute(&object(json!({"type": "radio", "value": 1}))).is_err());
    }

    #[test]
    fn hugepages_and_number() {
        assert!(check_attribute(&object(json!({"type": "custom_hugepages", "value": {"2048": 10, "1048576": 0}}))).is_ok());
        assert!(check_attribute(&object(json!({"type": "custom_hugepages", "value": {"2048": "ten"}}))).is_err());
        assert!(check_attribute(&object(json!({"type": "number", "value": 1.5}))).is_ok());
        assert!(check_attribute(&object(json!({"type": "number", "value": "1.5"}))).is_err());
    }

    #[test]
    fn repositories() {
        assert!(check_attribute(&object(json!({
            "type": "custom_repo_configuration",
            "value": [{"name": "ubuntu", "type": "deb", "uri": "http://archive", "suite": "trusty", "section": "main", "priority": null}]
        })))
        .is_ok());
        assert!(check_attribute(&object(json!({"type": "custom_repo_configuration", "value": []}))).is_err());
        let err = check_attribute(&object(json!({
            "type": "custom_repo_configuration",
            "value": [{"name": "ubuntu", "priority": "high"}]
        })))
        .unwrap_err();
        assert!(err.contains("priority"), "{err}");
    }
}
