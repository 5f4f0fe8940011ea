//! Rego snippet templating
//!
//! Pure string templating over retrieved records; no model is involved.
//! [`RenderConfig`] decides which columns appear in each stanza and which
//! `input.*` path their equality rule compares against.
//!
//! # Output shape
//!
//! ```text
//! package main
//!
//! # Generated Rego Policy
//!
//! # Vendor: Nokia, MOType: LNBTS, ...
//! allow {
//!     input.vendor == "Nokia"
//!     input.mo_type == "LNBTS"
//!     ...
//! }
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::table::RowRecord;
use crate::{Error, Result};

/// Default Rego package emitted ahead of the rule blocks.
pub const DEFAULT_PACKAGE: &str = "main";

/// Maps one table column to the input path its equality rule compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    /// Column name exactly as it appears in the table header
    pub column: String,
    /// Dotted path under `input`, e.g. `mo_type`
    pub input_path: String,
}

/// Rendering configuration: target package plus ordered field bindings.
///
/// The bound column set is an external contract fixed by the table schema.
/// Construction validates every input path;
/// [`validate_against`](Self::validate_against) checks the columns exist
/// before any query runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Rego package of the emitted snippet
    #[serde(default = "default_package")]
    pub package: String,
    /// Bindings rendered per stanza, in order
    pub fields: Vec<FieldBinding>,
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

impl RenderConfig {
    /// Build a config, validating the package and every input path.
    pub fn new(package: impl Into<String>, fields: Vec<FieldBinding>) -> Result<Self> {
        let config = Self {
            package: package.into(),
            fields,
        };
        config.validate_paths()?;
        Ok(config)
    }

    /// Derive a config binding every column to the snake_case form of its
    /// name, so `MO Type` and `MOType` both compare `input.mo_type`.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = columns
            .into_iter()
            .map(|column| {
                let column = column.as_ref().to_string();
                let input_path = snake_case(&column);
                FieldBinding { column, input_path }
            })
            .collect();

        Self::new(DEFAULT_PACKAGE, fields)
    }

    /// Load a config from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Render(format!("invalid render config: {e}")))?;
        config.validate_paths()?;
        Ok(config)
    }

    /// Check that every bound column exists in every record.
    ///
    /// Run once when the metadata store is loaded, so per-query rendering
    /// never needs a silent fallback for a missing key.
    pub fn validate_against(&self, records: &[RowRecord]) -> Result<()> {
        for field in &self.fields {
            let missing = records
                .iter()
                .enumerate()
                .find(|(_, record)| !record.metadata.contains_key(&field.column));
            if let Some((position, _)) = missing {
                return Err(Error::Input(format!(
                    "record {position} is missing bound column `{}`",
                    field.column
                )));
            }
        }
        Ok(())
    }

    fn validate_paths(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::Render("render config binds no fields".to_string()));
        }
        if !is_rego_path(&self.package) {
            return Err(Error::Render(format!(
                "`{}` is not a valid package name",
                self.package
            )));
        }
        for field in &self.fields {
            if !is_rego_path(&field.input_path) {
                return Err(Error::Render(format!(
                    "`{}` is not a valid input path for column `{}`",
                    field.input_path, field.column
                )));
            }
        }
        Ok(())
    }
}

/// Render retrieved records into one Rego snippet under a single package
/// header, in the order given (closest first).
pub fn render_policy(records: &[&RowRecord], config: &RenderConfig) -> Result<String> {
    let mut out = format!("package {}\n\n# Generated Rego Policy\n\n", config.package);

    for record in records {
        render_stanza(&mut out, record, config)?;
    }

    Ok(out)
}

fn render_stanza(out: &mut String, record: &RowRecord, config: &RenderConfig) -> Result<()> {
    let mut bound = Vec::with_capacity(config.fields.len());
    for field in &config.fields {
        let value = record.metadata.get(&field.column).ok_or_else(|| {
            Error::Render(format!("record is missing bound column `{}`", field.column))
        })?;
        sanitize(field, value)?;
        bound.push((field, value.as_str()));
    }

    let annotation = bound
        .iter()
        .map(|(field, value)| format!("{}: {value}", field.column))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "# {annotation}");

    out.push_str("allow {\n");
    for (field, value) in &bound {
        let _ = writeln!(out, "    input.{} == \"{value}\"", field.input_path);
    }
    out.push_str("}\n\n");

    Ok(())
}

/// Reject values that would escape the quoted string they are interpolated
/// into. Escaping instead would silently change the emitted constraint.
fn sanitize(field: &FieldBinding, value: &str) -> Result<()> {
    if value
        .chars()
        .any(|c| c == '"' || c == '\\' || c.is_control())
    {
        return Err(Error::Render(format!(
            "value for `{}` contains characters that cannot be quoted",
            field.column
        )));
    }
    Ok(())
}

/// Convert a column name to snake_case for use as an input path.
///
/// Splits on non-alphanumeric characters and on case boundaries:
/// `MO Type`, `MOType` and `moType` all become `mo_type`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let boundary = prev.is_lowercase()
                || prev.is_numeric()
                || (prev.is_uppercase() && chars.get(i + 1).is_some_and(|n| n.is_lowercase()));
            if boundary {
                out.push('_');
            }
        }

        out.extend(c.to_lowercase());
    }

    out.trim_end_matches('_').to_string()
}

fn is_rego_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_table_from_reader;

    fn slice_records() -> Vec<RowRecord> {
        read_table_from_reader(crate::testutil::SLICE_TABLE.as_bytes()).unwrap()
    }

    fn slice_config() -> RenderConfig {
        RenderConfig::from_columns(["Vendor", "MOType", "Attribute", "Operation", "Value"])
            .unwrap()
    }

    #[test]
    fn test_snake_case_forms() {
        assert_eq!(snake_case("Vendor"), "vendor");
        assert_eq!(snake_case("MOType"), "mo_type");
        assert_eq!(snake_case("MO Type"), "mo_type");
        assert_eq!(snake_case("moType"), "mo_type");
        assert_eq!(snake_case("Full Path"), "full_path");
        assert_eq!(snake_case("Attribute "), "attribute");
        assert_eq!(snake_case("param1"), "param1");
    }

    #[test]
    fn test_stanza_contains_fields_in_binding_order() {
        let records = slice_records();
        let rendered = render_policy(&[&records[0]], &slice_config()).unwrap();

        assert!(rendered.starts_with("package main\n\n# Generated Rego Policy\n\n"));
        assert!(rendered.contains("# Vendor: Nokia, MOType: LNBTS"));
        assert!(rendered.contains("input.vendor == \"Nokia\""));
        assert!(rendered.contains("input.mo_type == \"LNBTS\""));

        let vendor_at = rendered.find("input.vendor").unwrap();
        let mo_type_at = rendered.find("input.mo_type").unwrap();
        assert!(vendor_at < mo_type_at);
    }

    #[test]
    fn test_stanzas_follow_retrieval_order() {
        let records = slice_records();
        let rendered = render_policy(&[&records[1], &records[0]], &slice_config()).unwrap();

        let ericsson_at = rendered.find("\"Ericsson\"").unwrap();
        let nokia_at = rendered.find("\"Nokia\"").unwrap();
        assert!(ericsson_at < nokia_at);
        assert_eq!(rendered.matches("allow {").count(), 2);
        assert_eq!(rendered.matches("package").count(), 1);
    }

    #[test]
    fn test_no_records_renders_header_only() {
        let rendered = render_policy(&[], &slice_config()).unwrap();
        assert_eq!(rendered, "package main\n\n# Generated Rego Policy\n\n");
    }

    #[test]
    fn test_quote_in_value_is_rejected() {
        let records =
            read_table_from_reader("Vendor,Value\nNo\"kia,5\n".as_bytes()).unwrap();
        let config = RenderConfig::from_columns(["Vendor", "Value"]).unwrap();

        let err = render_policy(&[&records[0]], &config).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_newline_in_value_is_rejected() {
        let records =
            read_table_from_reader("Vendor,Value\n\"No\nkia\",5\n".as_bytes()).unwrap();
        let config = RenderConfig::from_columns(["Vendor", "Value"]).unwrap();

        let err = render_policy(&[&records[0]], &config).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_invalid_input_path_is_rejected_at_construction() {
        let err = RenderConfig::new(
            "main",
            vec![FieldBinding {
                column: "Vendor".to_string(),
                input_path: "9vendor".to_string(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_empty_binding_list_is_rejected() {
        let err = RenderConfig::new("main", Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_validate_against_flags_missing_column() {
        let records = slice_records();
        let config = RenderConfig::from_columns(["Vendor", "Region"]).unwrap();

        let err = config.validate_against(&records).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");
        std::fs::write(
            &path,
            r#"
package = "slice.policy"

[[fields]]
column = "Vendor"
input_path = "vendor"

[[fields]]
column = "MOType"
input_path = "mo_type"
"#,
        )
        .unwrap();

        let config = RenderConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.package, "slice.policy");
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[1].input_path, "mo_type");
    }

    #[test]
    fn test_toml_default_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");
        std::fs::write(
            &path,
            "[[fields]]\ncolumn = \"Vendor\"\ninput_path = \"vendor\"\n",
        )
        .unwrap();

        let config = RenderConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.package, DEFAULT_PACKAGE);
    }
}
