//! Typed module arguments

use ctera_core::{ArgumentError, Parameters};
use serde::de::DeserializeOwned;

/// Deserialize a module's parameters into its argument struct.
pub fn parse<T: DeserializeOwned>(params: &Parameters) -> Result<T, ArgumentError> {
    serde_json::from_value(params.clone().into_value())
        .map_err(|err| ArgumentError::Invalid(err.to_string()))
}

/// `required_if` check: when `condition` holds, every listed argument must be set.
pub fn required_if(
    condition: bool,
    state: &str,
    value: &str,
    required: &[(&str, bool)],
) -> Result<(), ArgumentError> {
    if !condition {
        return Ok(());
    }
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ArgumentError::RequiredIf {
            state: state.to_string(),
            value: value.to_string(),
            missing: missing.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Example {
        name: String,
        #[serde(default)]
        level: Option<String>,
    }

    #[test]
    fn test_parse_reports_missing_field() {
        let params: Parameters = serde_json::from_value(json!({"level": "1"})).unwrap();
        let err = parse::<Example>(&params).unwrap_err();
        assert!(err.to_string().contains("name"));

        let params: Parameters = serde_json::from_value(json!({"name": "a"})).unwrap();
        let parsed: Example = parse(&params).unwrap();
        assert_eq!(parsed.name, "a");
        assert!(parsed.level.is_none());
    }

    #[test]
    fn test_required_if() {
        assert!(required_if(false, "state", "present", &[("level", false)]).is_ok());
        assert_eq!(
            required_if(true, "state", "present", &[("level", false), ("name", true)]),
            Err(ArgumentError::RequiredIf {
                state: "state".to_string(),
                value: "present".to_string(),
                missing: "level".to_string(),
            })
        );
    }
}
