//! Index and constraint definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Name every primary index carries.
pub const PRIMARY_INDEX: &str = "primary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    Foreign,
}

impl IndexKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Index => "index",
            IndexKind::Foreign => "foreign",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary" => Ok(IndexKind::Primary),
            "unique" => Ok(IndexKind::Unique),
            "index" => Ok(IndexKind::Index),
            "foreign" => Ok(IndexKind::Foreign),
            other => Err(Error::definition(format!("Invalid index type \"{other}\""))),
        }
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignReference {
    pub table: String,
    /// Referenced fields, positionally matching the index fields
    pub fields: Vec<String>,
}

/// An index or constraint over one or more fields of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    name: String,
    kind: IndexKind,
    fields: Vec<String>,
    reference: Option<ForeignReference>,
}

impl IndexInfo {
    /// Create a non-foreign index. Primary indexes are always named `primary`.
    pub fn new<I, S>(name: impl Into<String>, fields: I, kind: IndexKind) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if kind == IndexKind::Foreign {
            return Err(Error::definition(
                "Foreign keys need referenced fields, use IndexInfo::foreign",
            ));
        }
        let name = if kind == IndexKind::Primary {
            PRIMARY_INDEX.to_string()
        } else {
            name.into()
        };
        let fields = collect_fields(&name, fields)?;
        Ok(Self {
            name,
            kind,
            fields,
            reference: None,
        })
    }

    pub fn primary<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PRIMARY_INDEX, fields, IndexKind::Primary)
    }

    pub fn unique<I, S>(name: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, fields, IndexKind::Unique)
    }

    pub fn index<I, S>(name: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, fields, IndexKind::Index)
    }

    /// Foreign key from `(local, referenced)` field pairs into `table`.
    pub fn foreign<I, L, R>(name: impl Into<String>, pairs: I, table: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let name = name.into();
        let (local, referenced): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(l, r)| (l.into(), r.into()))
            .unzip();
        let fields = collect_fields(&name, local)?;
        let table = table.into();
        if table.is_empty() {
            return Err(Error::definition(format!(
                "Missing referenced table in foreign key \"{name}\""
            )));
        }
        Ok(Self {
            name,
            kind: IndexKind::Foreign,
            fields,
            reference: Some(ForeignReference {
                table,
                fields: referenced,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Indexed fields; the local side for foreign keys.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn is_primary(&self) -> bool {
        self.kind == IndexKind::Primary
    }

    pub fn is_unique(&self) -> bool {
        matches!(self.kind, IndexKind::Primary | IndexKind::Unique)
    }

    pub fn is_foreign(&self) -> bool {
        self.kind == IndexKind::Foreign
    }

    pub fn reference(&self) -> Option<&ForeignReference> {
        self.reference.as_ref()
    }
}

fn collect_fields<I, S>(name: &str, fields: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
    if fields.is_empty() {
        return Err(Error::definition(format!("No fields in index \"{name}\"")));
    }
    if let Some(empty) = fields.iter().position(|f| f.trim().is_empty()) {
        return Err(Error::definition(format!(
            "Empty field name at position {empty} in index \"{name}\""
        )));
    }
    Ok(fields)
}
