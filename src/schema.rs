//! Field schema loading.
//!
//! A schema document is JSON holding an array of field descriptors, either at
//! the top level or under a named section:
//!
//! ```json
//! { "events": [ { "name": "user_id", "type": "INTEGER" },
//!               { "name": "payload", "type": "RECORD", "mode": "NULLABLE" } ] }
//! ```
//!
//! Only `name` and `type` are read; any other descriptor keys are ignored.
//! Declaration order is preserved so the schema can be echoed back verbatim.

use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr};

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value as JsonValue;

use crate::{error::SchemaParseError, value::ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Record,
    Integer,
    String,
    Float,
    Boolean,
    Timestamp,
}

impl SchemaType {
    /// Runtime kind a value must have to count as matching this type.
    /// Booleans are carried as integers and timestamps as strings.
    pub fn expected_kind(self) -> ValueKind {
        match self {
            SchemaType::Record => ValueKind::Record,
            SchemaType::Integer | SchemaType::Boolean => ValueKind::Integer,
            SchemaType::String | SchemaType::Timestamp => ValueKind::String,
            SchemaType::Float => ValueKind::Float,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::Record => "RECORD",
            SchemaType::Integer => "INTEGER",
            SchemaType::String => "STRING",
            SchemaType::Float => "FLOAT",
            SchemaType::Boolean => "BOOLEAN",
            SchemaType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        const ALL: [SchemaType; 6] = [
            SchemaType::Record,
            SchemaType::Integer,
            SchemaType::String,
            SchemaType::Float,
            SchemaType::Boolean,
            SchemaType::Timestamp,
        ];
        ALL.into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: SchemaType,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<SchemaField>,
    positions: HashMap<String, usize>,
}

impl Schema {
    pub fn from_fields<I>(fields: I) -> Result<Self, SchemaParseError>
    where
        I: IntoIterator<Item = SchemaField>,
    {
        let mut schema = Schema::default();
        for field in fields {
            if schema.positions.contains_key(&field.name) {
                return Err(SchemaParseError::DuplicateField(field.name));
            }
            schema
                .positions
                .insert(field.name.clone(), schema.fields.len());
            schema.fields.push(field);
        }
        Ok(schema)
    }

    /// Reads the schema at `path`, optionally taking the descriptor array
    /// stored under `section`.
    pub fn load(path: &Path, section: Option<&str>) -> Result<Self, SchemaParseError> {
        let text = fs::read_to_string(path).map_err(|source| SchemaParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, section)
    }

    pub fn parse(text: &str, section: Option<&str>) -> Result<Self, SchemaParseError> {
        let document: JsonValue = serde_json::from_str(text)?;
        let (descriptors, label) = match section {
            Some(name) => {
                let selected = document
                    .get(name)
                    .ok_or_else(|| SchemaParseError::MissingSection(name.to_string()))?;
                (selected, format!("section '{name}'"))
            }
            None => (&document, "document".to_string()),
        };
        let descriptors = descriptors
            .as_array()
            .ok_or(SchemaParseError::NotAnArray(label))?;

        let fields = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| parse_descriptor(index, descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_fields(fields)
    }

    pub fn field_type(&self, name: &str) -> Option<SchemaType> {
        self.positions
            .get(name)
            .map(|&idx| self.fields[idx].field_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, field.field_type.as_str())?;
        }
        map.end()
    }
}

fn parse_descriptor(index: usize, descriptor: &JsonValue) -> Result<SchemaField, SchemaParseError> {
    let object = descriptor
        .as_object()
        .ok_or(SchemaParseError::NotAnObject { index })?;
    let name = object
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or(SchemaParseError::MissingKey { index, key: "name" })?;
    let tag = object
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or(SchemaParseError::MissingKey { index, key: "type" })?;
    let field_type = tag
        .parse::<SchemaType>()
        .map_err(|_| SchemaParseError::UnknownType {
            field: name.to_string(),
            tag: tag.to_string(),
        })?;
    Ok(SchemaField {
        name: name.to_string(),
        field_type,
    })
}
