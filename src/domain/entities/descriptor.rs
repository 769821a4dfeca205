//! Addon descriptor - parses the per-directory metadata file

use std::collections::HashMap;
use std::path::Path;

use regex_lite::Regex;

use crate::application::errors::DescriptorError;

/// Name of the metadata file expected in every addon directory
pub const DESCRIPTOR_FILE: &str = "addon.meta";

const VERSION_PATTERN: &str = r"^\d+\.\d+(\.\d+)?$";

/// A single parsed descriptor field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Parse descriptor file contents into raw fields.
///
/// Blank lines and lines starting with `#` are skipped. Each remaining line
/// is split on the first colon only, so values like `https://...` survive.
/// The literals `true`/`false` (any case) become booleans; the value of a
/// `priority` key becomes a number when it parses as one.
pub fn parse_fields(contents: &str) -> HashMap<String, FieldValue> {
    let mut fields = HashMap::new();

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();

        let field = if value.eq_ignore_ascii_case("true") {
            FieldValue::Bool(true)
        } else if value.eq_ignore_ascii_case("false") {
            FieldValue::Bool(false)
        } else if key == "priority" {
            match value.parse::<i64>() {
                Ok(n) => FieldValue::Number(n),
                Err(_) => FieldValue::Text(value.to_string()),
            }
        } else {
            FieldValue::Text(value.to_string())
        };

        fields.insert(key, field);
    }

    fields
}

/// Typed addon metadata, validated from the raw fields
#[derive(Debug, Clone)]
pub struct AddonDescriptor {
    pub author: String,
    pub name: Option<String>,
    pub version: Option<String>,
    pub priority: u32,
    pub enabled: bool,
    /// Feature entry file, relative to the module directory
    pub addon_file: Option<String>,
    /// Command entry file, relative to the module directory
    pub command_file: Option<String>,
    /// Deprecated single entry file, accepted as a feature entry
    pub main_file: Option<String>,
    /// Relative path to a subdirectory of further modules
    pub extensions: Option<String>,
    /// Deprecated kind tag
    pub legacy_type: Option<String>,
    /// Unrecognized keys, preserved but ignored by the host
    pub extra: HashMap<String, FieldValue>,
}

impl AddonDescriptor {
    /// Read and validate a descriptor file.
    ///
    /// Returns the descriptor plus non-fatal warnings the caller should log.
    /// Any required-field violation is an error and the module must be
    /// dropped from discovery.
    pub fn from_file(path: impl AsRef<Path>) -> Result<(Self, Vec<String>), DescriptorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DescriptorError::Unreadable(format!("{}: {}", path.display(), e)))?;
        Self::from_fields(parse_fields(&contents))
    }

    /// Validate raw fields into a typed descriptor.
    pub fn from_fields(
        mut fields: HashMap<String, FieldValue>,
    ) -> Result<(Self, Vec<String>), DescriptorError> {
        let mut warnings = Vec::new();

        let author = match fields.remove("author") {
            Some(FieldValue::Text(s)) if !s.is_empty() => s,
            Some(_) | None => return Err(DescriptorError::MissingField("author".to_string())),
        };

        let name = take_text(&mut fields, "name")?;
        let addon_file = take_relative_path(&mut fields, "addonfile")?;
        let command_file = take_relative_path(&mut fields, "commandfile")?;
        let main_file = take_relative_path(&mut fields, "mainfile")?;
        let extensions = take_relative_path(&mut fields, "extensions")?;
        let legacy_type = take_text(&mut fields, "type")?;

        if addon_file.is_none() && command_file.is_none() && main_file.is_none() {
            return Err(DescriptorError::NoEntryPoint);
        }

        let priority = match fields.remove("priority") {
            None => 0,
            Some(FieldValue::Number(n)) => {
                u32::try_from(n).map_err(|_| DescriptorError::InvalidField {
                    field: "priority".to_string(),
                    reason: format!("expected an integer between 0 and {}, got {}", u32::MAX, n),
                })?
            }
            Some(other) => {
                return Err(DescriptorError::InvalidField {
                    field: "priority".to_string(),
                    reason: format!("expected a non-negative integer, got {:?}", other),
                })
            }
        };

        let enabled = match fields.remove("enabled") {
            None => true,
            Some(FieldValue::Bool(b)) => b,
            Some(other) => {
                return Err(DescriptorError::InvalidField {
                    field: "enabled".to_string(),
                    reason: format!("expected true or false, got {:?}", other),
                })
            }
        };

        // A malformed version never drops the module; the coerced literal is
        // kept as text so the format check below produces the warning.
        let version = match fields.remove("version") {
            None => None,
            Some(FieldValue::Text(s)) => Some(s),
            Some(FieldValue::Bool(b)) => Some(b.to_string()),
            Some(FieldValue::Number(n)) => Some(n.to_string()),
        };
        if let Some(v) = &version {
            let re = Regex::new(VERSION_PATTERN)
                .map_err(|e| DescriptorError::InvalidField {
                    field: "version".to_string(),
                    reason: e.to_string(),
                })?;
            if !re.is_match(v) {
                warnings.push(format!("version '{}' does not match expected format", v));
            }
        }

        Ok((
            Self {
                author,
                name,
                version,
                priority,
                enabled,
                addon_file,
                command_file,
                main_file,
                extensions,
                legacy_type,
                extra: fields,
            },
            warnings,
        ))
    }
}

fn take_text(
    fields: &mut HashMap<String, FieldValue>,
    key: &str,
) -> Result<Option<String>, DescriptorError> {
    match fields.remove(key) {
        None => Ok(None),
        Some(FieldValue::Text(s)) => Ok(Some(s)),
        Some(other) => Err(DescriptorError::InvalidField {
            field: key.to_string(),
            reason: format!("expected a string, got {:?}", other),
        }),
    }
}

fn take_relative_path(
    fields: &mut HashMap<String, FieldValue>,
    key: &str,
) -> Result<Option<String>, DescriptorError> {
    let value = take_text(fields, key)?;
    if let Some(v) = &value {
        if Path::new(v).is_absolute() {
            return Err(DescriptorError::InvalidField {
                field: key.to_string(),
                reason: "file paths must be relative".to_string(),
            });
        }
    }
    Ok(value)
}
