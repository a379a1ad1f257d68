//! The export metadata document consumed by the extractor.
//!
//! This mirrors what the source toolchain records as package export data:
//! exported declarations with their doc comments and types written in
//! source syntax. Types stay unparsed strings here; `mobind-extract` owns
//! their grammar.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub packages: Vec<ExportPackage>,
}

impl ExportData {
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let data = Self::from_json(&text)?;
        log::debug!(
            "Read export metadata for {} package(s) from {}",
            data.packages.len(),
            path.display()
        );
        Ok(data)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportPackage {
    /// Import path.
    pub path: String,
    /// Package identifier.
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub types: Vec<ExportType>,
    #[serde(default)]
    pub funcs: Vec<ExportFunc>,
    #[serde(default)]
    pub consts: Vec<ExportConst>,
    #[serde(default)]
    pub vars: Vec<ExportVar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportType {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(flatten)]
    pub def: ExportTypeDef,
}

/// The definition of an exported type, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportTypeDef {
    Struct {
        #[serde(default)]
        fields: Vec<ExportField>,
        #[serde(default)]
        methods: Vec<ExportMethod>,
    },
    Interface {
        #[serde(default)]
        methods: Vec<ExportMethod>,
    },
    /// `type T <underlying>` for any non struct/interface underlying type.
    Defined {
        underlying: String,
        #[serde(default)]
        methods: Vec<ExportMethod>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportField {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMethod {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub pointer_receiver: bool,
    #[serde(default)]
    pub params: Vec<ExportParam>,
    /// Result types in source syntax.
    #[serde(default)]
    pub results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFunc {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub params: Vec<ExportParam>,
    #[serde(default)]
    pub results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConst {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    /// Empty for untyped constants, whose type follows from the literal.
    #[serde(default, rename = "type")]
    pub ty: String,
    /// Literal in source syntax: `42`, `-1`, `2.5`, `true`, `"text"`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportVar {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_tagged_type_definitions() {
        let data = ExportData::from_json(
            r#"{
              "packages": [{
                "path": "example.com/doctest",
                "name": "doctest",
                "types": [
                  { "name": "Struct", "doc": "This is a comment.", "kind": "struct" },
                  { "name": "Celsius", "kind": "defined", "underlying": "float64" },
                  { "name": "Greeter", "kind": "interface",
                    "methods": [{ "name": "Greet", "params": [{"name": "who", "type": "string"}], "results": ["string"] }] }
                ]
              }]
            }"#,
        )
        .unwrap();

        let pkg = &data.packages[0];
        assert_eq!(pkg.types.len(), 3);
        assert_eq!(pkg.types[0].doc, "This is a comment.");
        assert!(matches!(pkg.types[0].def, ExportTypeDef::Struct { ref fields, .. } if fields.is_empty()));
        assert!(matches!(pkg.types[1].def, ExportTypeDef::Defined { ref underlying, .. } if underlying == "float64"));
        match &pkg.types[2].def {
            ExportTypeDef::Interface { methods } => {
                assert_eq!(methods[0].params[0].ty, "string");
                assert_eq!(methods[0].results, vec!["string"]);
            }
            other => panic!("expected interface, got {:?}", other),
        }
    }

    #[test]
    fn untyped_constants_parse_without_a_type() {
        let data = ExportData::from_json(
            r#"{
              "packages": [{
                "path": "example.com/consts",
                "name": "consts",
                "consts": [
                  { "name": "Pi", "value": "3.14" },
                  { "name": "Answer", "type": "int64", "value": "42" }
                ]
              }]
            }"#,
        )
        .unwrap();
        let consts = &data.packages[0].consts;
        assert_eq!(consts[0].ty, "");
        assert_eq!(consts[0].value, "3.14");
        assert_eq!(consts[1].ty, "int64");
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = ExportData::from_json(r#"{ "packages": [{ "name": "x" }] }"#).unwrap_err();
        assert!(matches!(err, SourceError::MetadataParse(_)));
    }
}
