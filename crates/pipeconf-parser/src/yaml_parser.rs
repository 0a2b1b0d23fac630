//! YAML helpers shared by the metadata and configuration parsers

use crate::error::{ParseError, Result};
use pipeconf_core::RawValue;
use serde_yaml::Value as YamlValue;

/// YAML parser utilities
pub struct YamlParser;

impl YamlParser {
    pub fn parse(yaml_str: &str) -> Result<YamlValue> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// Required string field
    pub fn get_string(obj: &YamlValue, field: &str) -> Result<String> {
        obj.get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ParseError::MissingField {
                field: field.to_string(),
            })
    }

    pub fn get_optional_string(obj: &YamlValue, field: &str) -> Option<String> {
        obj.get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn get_optional_bool(obj: &YamlValue, field: &str) -> Option<bool> {
        obj.get(field).and_then(|v| v.as_bool())
    }

    pub fn get_optional_array<'a>(obj: &'a YamlValue, field: &str) -> Option<&'a Vec<YamlValue>> {
        obj.get(field).and_then(|v| v.as_sequence())
    }

    /// Render a scalar as text; `None` for null
    pub fn scalar_to_string(value: &YamlValue) -> Option<String> {
        match value {
            YamlValue::Null => None,
            YamlValue::Bool(b) => Some(b.to_string()),
            YamlValue::Number(n) => Some(n.to_string()),
            YamlValue::String(s) => Some(s.clone()),
            YamlValue::Tagged(t) => Self::scalar_to_string(&t.value),
            // Structured values are handed over as compact JSON text
            YamlValue::Sequence(_) | YamlValue::Mapping(_) => serde_json::to_string(value).ok(),
        }
    }

    /// Convert a configuration value into its raw textual form.
    /// Sequences become lists, null becomes "no value".
    pub fn to_raw_value(value: &YamlValue) -> Option<RawValue> {
        match value {
            YamlValue::Sequence(items) => Some(RawValue::List(
                items.iter().filter_map(Self::scalar_to_string).collect(),
            )),
            YamlValue::Tagged(t) => Self::to_raw_value(&t.value),
            other => Self::scalar_to_string(other).map(RawValue::Text),
        }
    }

    /// Read a list of names that may be written either as plain strings or
    /// as `{name: ...}` mappings
    pub fn get_name_list(obj: &YamlValue, field: &str) -> Vec<(String, YamlValue)> {
        Self::get_optional_array(obj, field)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        YamlValue::String(s) => Some((s.clone(), YamlValue::Null)),
                        other => Self::get_optional_string(other, "name")
                            .map(|name| (name, other.clone())),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Warnings for keys of `obj` outside `known_fields`, with suggestions
    pub fn validate_fields(obj: &YamlValue, known_fields: &[&str], context: &str) -> Vec<String> {
        let Some(mapping) = obj.as_mapping() else {
            return Vec::new();
        };
        mapping
            .keys()
            .filter_map(YamlValue::as_str)
            .filter(|field| !known_fields.contains(field))
            .map(|field| match find_similar(field, known_fields.iter().copied()) {
                Some(similar) => format!(
                    "Unknown field '{}' in {}. Did you mean '{}'?",
                    field, context, similar
                ),
                None => format!("Unknown field '{}' in {}.", field, context),
            })
            .collect()
    }
}

/// Closest candidate within an edit distance of 2
pub fn find_similar<'a>(field: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|known| (levenshtein_distance(field, known), known))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, known)| known.to_string())
}

/// Edit distance, keeping only the previous row
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml_str = r#"
name: test
value: 42
"#;
        let yaml = YamlParser::parse(yaml_str).unwrap();
        assert_eq!(YamlParser::get_string(&yaml, "name").unwrap(), "test");
        assert!(YamlParser::get_string(&yaml, "missing").is_err());
    }

    #[test]
    fn test_to_raw_value() {
        let yaml = YamlParser::parse(
            r#"
text: npm ci
flag: true
count: 3
empty:
list: [a, 1, false]
"#,
        )
        .unwrap();

        assert_eq!(
            YamlParser::to_raw_value(&yaml["text"]),
            Some(RawValue::text("npm ci"))
        );
        assert_eq!(
            YamlParser::to_raw_value(&yaml["flag"]),
            Some(RawValue::text("true"))
        );
        assert_eq!(
            YamlParser::to_raw_value(&yaml["count"]),
            Some(RawValue::text("3"))
        );
        assert_eq!(YamlParser::to_raw_value(&yaml["empty"]), None);
        assert_eq!(
            YamlParser::to_raw_value(&yaml["list"]),
            Some(RawValue::list(["a", "1", "false"]))
        );
    }

    #[test]
    fn test_name_list_accepts_both_forms() {
        let yaml = YamlParser::parse(
            r#"
aliases:
  - sonarServerUrl
  - name: sonarHost
    deprecated: true
"#,
        )
        .unwrap();

        let names: Vec<String> = YamlParser::get_name_list(&yaml, "aliases")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["sonarServerUrl", "sonarHost"]);
    }

    #[test]
    fn test_validate_fields_suggests() {
        let yaml = YamlParser::parse("name: x\nmandtory: true\n").unwrap();
        let warnings = YamlParser::validate_fields(&yaml, &["name", "mandatory"], "param 'x'");

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Did you mean 'mandatory'?"));
    }

    #[test]
    fn test_find_similar() {
        let candidates = ["installCommand", "runCommand", "modulePath"];
        assert_eq!(
            find_similar("instalCommand", candidates.iter().copied()),
            Some("installCommand".to_string())
        );
        assert_eq!(find_similar("verbose", candidates.iter().copied()), None);
    }
}
