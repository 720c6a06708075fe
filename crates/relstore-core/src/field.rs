//! Field definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Semantic type of a field, independent of any SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Integer,
    Decimal,
    String,
    DateTime,
    /// Structured data stored serialized
    Serial,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Boolean,
        FieldType::Integer,
        FieldType::Decimal,
        FieldType::String,
        FieldType::DateTime,
        FieldType::Serial,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::String => "string",
            FieldType::DateTime => "datetime",
            FieldType::Serial => "serial",
        }
    }

    /// Whether values of this type are written unquoted in SQL defaults.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::Boolean | FieldType::Integer | FieldType::Decimal
        )
    }

    /// Attributes a field of this type may carry.
    pub const fn allows(self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Null => true,
            Attribute::Default => !matches!(self, FieldType::Serial),
            Attribute::Length => matches!(
                self,
                FieldType::Integer | FieldType::Decimal | FieldType::String
            ),
            Attribute::Precision => matches!(self, FieldType::Decimal),
            Attribute::AutoIncrement => matches!(self, FieldType::Integer),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::definition(format!("Invalid field type \"{s}\"")))
    }
}

/// Attribute names, used for per-type validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Length,
    Precision,
    Null,
    AutoIncrement,
    Default,
}

impl Attribute {
    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Length => "length",
            Attribute::Precision => "precision",
            Attribute::Null => "null",
            Attribute::AutoIncrement => "auto_increment",
            Attribute::Default => "default",
        }
    }
}

/// Optional storage attributes of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAttributes {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub nullable: bool,
    pub auto_increment: bool,
    /// Default value as it appears in SQL, unquoted
    pub default: Option<String>,
}

impl FieldAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attributes that are actually set.
    pub fn present(&self) -> Vec<Attribute> {
        let mut set = Vec::new();
        if self.length.is_some() {
            set.push(Attribute::Length);
        }
        if self.precision.is_some() {
            set.push(Attribute::Precision);
        }
        if self.nullable {
            set.push(Attribute::Null);
        }
        if self.auto_increment {
            set.push(Attribute::AutoIncrement);
        }
        if self.default.is_some() {
            set.push(Attribute::Default);
        }
        set
    }
}

/// A named, typed field of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    name: String,
    field_type: FieldType,
    mapping: Option<String>,
    attributes: FieldAttributes,
}

impl FieldInfo {
    /// Create a field, rejecting attributes the type does not support.
    ///
    /// A field with a default value is always nullable.
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        attributes: FieldAttributes,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::definition("Field name can not be empty"));
        }

        if let Some(forbidden) = attributes
            .present()
            .into_iter()
            .find(|a| !field_type.allows(*a))
        {
            return Err(Error::definition(format!(
                "Forbidden attribute \"{}\" for {} field \"{}\"",
                forbidden.as_str(),
                field_type,
                name
            )));
        }

        let mut attributes = attributes;
        if attributes.default.is_some() {
            attributes.nullable = true;
        }

        Ok(Self {
            name,
            field_type,
            mapping: None,
            attributes,
        })
    }

    /// Create a field from a type name such as `"integer"`.
    pub fn parse(
        name: impl Into<String>,
        type_name: &str,
        attributes: FieldAttributes,
    ) -> Result<Self> {
        Self::new(name, type_name.parse()?, attributes)
    }

    /// Plain field of the given type without attributes.
    pub fn of(name: impl Into<String>, field_type: FieldType) -> Result<Self> {
        Self::new(name, field_type, FieldAttributes::default())
    }

    /// Store the field under a different column name. An empty mapping is ignored.
    pub fn with_mapping(mut self, mapping: impl Into<String>) -> Self {
        let mapping = mapping.into();
        self.mapping = (!mapping.is_empty()).then_some(mapping);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Column name in storage; the field name unless mapped.
    pub fn mapping(&self) -> &str {
        self.mapping.as_deref().unwrap_or(&self.name)
    }

    pub fn attributes(&self) -> &FieldAttributes {
        &self.attributes
    }

    pub fn is_nullable(&self) -> bool {
        self.attributes.nullable
    }

    pub fn is_auto_increment(&self) -> bool {
        self.attributes.auto_increment
    }
}
