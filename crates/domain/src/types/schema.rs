//! Remote database schema descriptions
//!
//! Only property names and types matter for matching, and their order in the
//! remote response is significant: "first property of type X" fallbacks
//! follow it. [`DatabaseSchema`] therefore keeps properties in the order they
//! were received instead of going through a sorted map.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Property type as reported by the remote database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyKind {
    Title,
    RichText,
    Url,
    Select,
    Date,
    #[default]
    Unknown,
    Other(String),
}

impl PropertyKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Url => "url",
            Self::Select => "select",
            Self::Date => "date",
            Self::Unknown => "",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for PropertyKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "title" => Self::Title,
            "rich_text" => Self::RichText,
            "url" => Self::Url,
            "select" => Self::Select,
            "date" => Self::Date,
            "" => Self::Unknown,
            _ => Self::Other(value),
        }
    }
}

impl From<PropertyKind> for String {
    fn from(value: PropertyKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, typed property of a remote database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaProperty {
    pub name: String,
    pub kind: PropertyKind,
}

impl SchemaProperty {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// Ordered property set of a remote database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseSchema {
    properties: Vec<SchemaProperty>,
}

impl DatabaseSchema {
    pub fn new(properties: Vec<SchemaProperty>) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &[SchemaProperty] {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_property_of(&self, name: &str, kind: &PropertyKind) -> bool {
        self.get(name).is_some_and(|property| &property.kind == kind)
    }

    /// First property of the given type, in remote order.
    pub fn first_of(&self, kind: &PropertyKind) -> Option<&SchemaProperty> {
        self.properties.iter().find(|property| &property.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[derive(Deserialize)]
struct PropertyDefinition {
    #[serde(rename = "type", default)]
    kind: PropertyKind,
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = DatabaseSchema;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a mapping of property names to property definitions")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut properties = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, definition)) = map.next_entry::<String, PropertyDefinition>()? {
            properties.push(SchemaProperty { name, kind: definition.kind });
        }
        Ok(DatabaseSchema { properties })
    }
}

impl<'de> Deserialize<'de> for DatabaseSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SchemaVisitor)
    }
}
