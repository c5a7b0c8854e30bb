// file: src/parser/frontmatter.rs
// description: YAML frontmatter extraction from corpus markdown files
// reference: https://docs.rs/yaml-rust

use crate::error::{AssistantError, Result};
use std::collections::HashMap;
use yaml_rust::{Yaml, YamlLoader};

pub struct FrontmatterParser;

#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    pub fields: HashMap<String, String>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

impl FrontmatterParser {
    pub fn new() -> Self {
        Self
    }

    /// Splits `---` delimited YAML from the body. Returns `None` when the
    /// content has no frontmatter block.
    pub fn extract(&self, file: &str, content: &str) -> Result<Option<(Frontmatter, String)>> {
        if !content.starts_with("---") {
            return Ok(None);
        }

        let parts: Vec<&str> = content.splitn(3, "---").collect();

        if parts.len() < 3 {
            return Ok(None);
        }

        let yaml_content = parts[1].trim();
        let remaining_content = parts[2].trim();

        let docs = YamlLoader::load_from_str(yaml_content).map_err(|e| {
            AssistantError::DocumentParse {
                file: file.to_string(),
                message: format!("YAML frontmatter parse error: {}", e),
            }
        })?;

        let mut fields = HashMap::new();

        if let Some(Yaml::Hash(hash)) = docs.first() {
            for (key, value) in hash {
                if let (Some(k), Some(v)) = (key.as_str(), scalar_to_string(value)) {
                    fields.insert(k.to_string(), v);
                }
            }
        }

        Ok(Some((
            Frontmatter { fields },
            remaining_content.to_string(),
        )))
    }
}

fn scalar_to_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Real(r) => Some(r.clone()),
        Yaml::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Default for FrontmatterParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_extraction() {
        let parser = FrontmatterParser::new();
        let content = "---\ndoc_id: tn_rent_control_act_2019\njurisdiction: tamil_nadu\nyear: 2019\n---\n\n# Rent Control";

        let (frontmatter, remaining) = parser.extract("act.md", content).unwrap().unwrap();
        assert_eq!(frontmatter.get("doc_id"), Some("tn_rent_control_act_2019"));
        assert_eq!(frontmatter.get("year"), Some("2019"));
        assert!(remaining.starts_with("# Rent Control"));
    }

    #[test]
    fn test_no_frontmatter() {
        let parser = FrontmatterParser::new();
        assert!(parser.extract("act.md", "# Just a heading").unwrap().is_none());
    }

    #[test]
    fn test_blank_values_are_missing() {
        let parser = FrontmatterParser::new();
        let (frontmatter, _) = parser
            .extract("act.md", "---\ntitle: \"\"\nsource_type: statute\n---\nbody")
            .unwrap()
            .unwrap();
        assert_eq!(frontmatter.get("title"), None);
        assert_eq!(frontmatter.get("source_type"), Some("statute"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let parser = FrontmatterParser::new();
        assert!(parser.extract("bad.md", "---\ntitle: [unclosed\n---\nbody").is_err());
    }
}
