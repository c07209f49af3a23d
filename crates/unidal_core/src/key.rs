//! Hierarchical record keys.
//!
//! A [`Key`] addresses a single record: a kind (collection name) plus an
//! identifier, optionally chained to a parent key for nested recordsets.
//! Construction and validation are deliberately separate steps; the
//! caller validates before using a key for anything that assumes
//! validity, such as rendering its path.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::context::Context;
use crate::error::DalResult;
use crate::insert::IdGenerator;
use crate::record::Record;

/// A named scalar reference used to build composite identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVal {
    /// Field name. Must not be blank.
    pub name: String,
    /// Field value. Must not be null.
    pub value: Value,
}

impl FieldVal {
    /// Creates a field reference.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Checks the field invariants: non-blank name, non-null value.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.name.trim().is_empty() {
            return Err(KeyError::BlankFieldName);
        }
        if self.value.is_null() {
            return Err(KeyError::NullFieldValue {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// The identifier part of a [`Key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    /// Integer identifier.
    Int(i64),
    /// String identifier.
    String(String),
    /// Composite identifier: an ordered set of named field references.
    Fields(Vec<FieldVal>),
}

impl IdValue {
    /// The kind of identifier this value carries.
    #[must_use]
    pub fn kind(&self) -> IdKind {
        match self {
            IdValue::Int(_) => IdKind::Int,
            IdValue::String(_) => IdKind::String,
            IdValue::Fields(_) => IdKind::Composite,
        }
    }
}

impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Int(id) => write!(f, "{id}"),
            IdValue::String(id) => f.write_str(id),
            IdValue::Fields(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", field.name, field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<i64> for IdValue {
    fn from(id: i64) -> Self {
        IdValue::Int(id)
    }
}

impl From<i32> for IdValue {
    fn from(id: i32) -> Self {
        IdValue::Int(i64::from(id))
    }
}

impl From<&str> for IdValue {
    fn from(id: &str) -> Self {
        IdValue::String(id.to_owned())
    }
}

impl From<String> for IdValue {
    fn from(id: String) -> Self {
        IdValue::String(id)
    }
}

impl From<Vec<FieldVal>> for IdValue {
    fn from(fields: Vec<FieldVal>) -> Self {
        IdValue::Fields(fields)
    }
}

/// Hint describing what kind of identifier a query's keys use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdKind {
    /// String identifiers.
    #[default]
    String,
    /// Integer identifiers.
    Int,
    /// Composite field-list identifiers.
    Composite,
}

/// Key validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    /// The key, at some level of its chain, has a blank kind.
    #[error("key must have a non-blank 'kind'")]
    BlankKind,

    /// An element of a composite identifier failed validation.
    #[error("key is referencing invalid field #{index}: {source}")]
    InvalidField {
        /// Position of the offending field.
        index: usize,
        /// Why the field is invalid.
        #[source]
        source: Box<KeyError>,
    },

    /// A composite-identifier field has a blank name.
    #[error("name is a required field property")]
    BlankFieldName,

    /// A composite-identifier field has a null value.
    #[error("field '{name}' has no value")]
    NullFieldValue {
        /// Name of the offending field.
        name: String,
    },

    /// The parent chain contains an invalid key.
    #[error("invalid parent key: {0}")]
    InvalidParent(#[source] Box<KeyError>),
}

/// A full path to a record: kind plus identifier, with an optional
/// parent chain for nested recordsets.
///
/// Keys are immutable once constructed; deriving a child key never
/// mutates a key observed elsewhere. Rendering the path of an invalid
/// key panics, because path rendering is assumed to happen only after
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    parent: Option<Box<Key>>,
    kind: String,
    id: IdValue,
}

impl Key {
    /// Starts building a key of the given kind.
    pub fn builder(kind: impl Into<String>) -> KeyBuilder {
        KeyBuilder {
            kind: kind.into(),
            parent: None,
            id: None,
        }
    }

    /// Creates a root-level key with a string identifier.
    pub fn with_string_id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            parent: None,
            kind: kind.into(),
            id: IdValue::String(id.into()),
        }
    }

    /// Creates a root-level key with an integer identifier.
    pub fn with_int_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            parent: None,
            kind: kind.into(),
            id: IdValue::Int(id),
        }
    }

    /// Creates a root-level key with a composite identifier.
    pub fn with_fields(kind: impl Into<String>, fields: Vec<FieldVal>) -> Self {
        Self {
            parent: None,
            kind: kind.into(),
            id: IdValue::Fields(fields),
        }
    }

    /// The collection name this key addresses.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identifier within the collection.
    #[must_use]
    pub fn id(&self) -> &IdValue {
        &self.id
    }

    /// The parent key, if this key addresses a nested recordset.
    #[must_use]
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Distance to the root of the chain. A root key has level 0.
    #[must_use]
    pub fn level(&self) -> usize {
        match &self.parent {
            None => 0,
            Some(parent) => parent.level() + 1,
        }
    }

    /// Checks the key invariants, recursing through the parent chain.
    ///
    /// Returns the first violated invariant: a blank kind at any level,
    /// or an invalid element of a composite identifier.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.kind.trim().is_empty() {
            return Err(KeyError::BlankKind);
        }
        if let IdValue::Fields(fields) = &self.id {
            for (index, field) in fields.iter().enumerate() {
                field.validate().map_err(|source| KeyError::InvalidField {
                    index,
                    source: Box::new(source),
                })?;
            }
        }
        if let Some(parent) = &self.parent {
            parent
                .validate()
                .map_err(|source| KeyError::InvalidParent(Box::new(source)))?;
        }
        Ok(())
    }

    pub(crate) fn set_id(&mut self, id: IdValue) {
        self.id = id;
    }
}

impl fmt::Display for Key {
    /// Renders the textual path: `kind/id` pairs from root to leaf,
    /// joined by `/`.
    ///
    /// # Panics
    ///
    /// Panics if the key is invalid. Callers are required to validate
    /// before rendering; an invalid key here is a caller bug.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Err(err) = self.validate() {
            panic!("will not render the path of an invalid key: {err}");
        }
        let mut parts = Vec::with_capacity((self.level() + 1) * 2);
        let mut key = self;
        loop {
            parts.push(key.id.to_string());
            parts.push(key.kind.clone());
            match &key.parent {
                Some(parent) => key = parent,
                None => break,
            }
        }
        for (i, part) in parts.iter().rev().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

/// Builder applying key options in call order.
///
/// Later identifier-assigning options overwrite earlier ones, matching
/// apply-in-call-order semantics.
#[derive(Debug)]
pub struct KeyBuilder {
    kind: String,
    parent: Option<Box<Key>>,
    id: Option<IdValue>,
}

impl KeyBuilder {
    /// Sets a string identifier.
    #[must_use]
    pub fn string_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(IdValue::String(id.into()));
        self
    }

    /// Sets an integer identifier.
    #[must_use]
    pub fn int_id(mut self, id: i64) -> Self {
        self.id = Some(IdValue::Int(id));
        self
    }

    /// Sets the identifier directly.
    #[must_use]
    pub fn id(mut self, id: impl Into<IdValue>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a composite identifier.
    #[must_use]
    pub fn fields(mut self, fields: Vec<FieldVal>) -> Self {
        self.id = Some(IdValue::Fields(fields));
        self
    }

    /// Chains this key under a parent key.
    #[must_use]
    pub fn parent(mut self, parent: Key) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Runs an identifier generator against the key under construction.
    ///
    /// The generator sees a record view of the partial key and assigns
    /// the generated identifier through it.
    ///
    /// # Panics
    ///
    /// Panics if an identifier was already assigned; generating over an
    /// explicit identifier is a caller bug.
    pub fn generate_id(mut self, ctx: &Context, generator: &IdGenerator) -> DalResult<Self> {
        if self.id.is_some() {
            panic!("an attempt to set an id generator for a key that already has an id value");
        }
        let key = Key {
            parent: self.parent.take(),
            kind: self.kind.clone(),
            id: IdValue::String(String::new()),
        };
        let mut view = Record::new_unchecked(key);
        generator(ctx, &mut view)?;
        let key = view.into_key();
        self.parent = key.parent;
        self.id = Some(key.id);
        Ok(self)
    }

    /// Finishes the key.
    ///
    /// # Panics
    ///
    /// Panics if no identifier-assigning option was applied: every key
    /// must carry an identifier.
    #[must_use]
    pub fn build(self) -> Key {
        let Some(id) = self.id else {
            panic!("a key must be built with at least one identifier-assigning option");
        };
        Key {
            parent: self.parent,
            kind: self.kind,
            id,
        }
    }
}
