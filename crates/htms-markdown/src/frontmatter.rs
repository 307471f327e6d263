//! Frontmatter extraction and parsing.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Scalar fields from a Markdown file's YAML frontmatter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// Field values rendered as strings; nested values are skipped
    pub fields: BTreeMap<String, String>,
}

impl Frontmatter {
    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Extract frontmatter from Markdown content.
///
/// Returns the parsed frontmatter and the remaining content after the
/// frontmatter block. A leading `---` with no closing fence, or a block that is
/// not a YAML mapping, is treated as ordinary Markdown.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let Some(after_open) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return Ok((None, source));
    };

    let (yaml_content, remaining) = if let Some(rest) = after_open.strip_prefix("---") {
        ("", rest)
    } else {
        let Some(close_pos) = after_open.find("\n---") else {
            return Ok((None, source));
        };
        (&after_open[..close_pos], &after_open[close_pos + 4..])
    };

    let value: Value = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    let fields = match value {
        Value::Null => BTreeMap::new(),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .filter_map(|(key, value)| Some((scalar(key)?, scalar(value)?)))
            .collect(),
        _ => return Ok((None, source)),
    };

    Ok((Some(Frontmatter { fields }), remaining.trim_start()))
}

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}
