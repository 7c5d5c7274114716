//! Core types for kwindex
//!
//! This module defines the foundational types:
//! - ObjectId: integer id of a searchable object
//! - ObjectTypeId: type scope of an object
//! - ChunkKey: bucket identifier of the sharded keyword index
//! - EncodedChunk: one shard as produced by the indexer
//! - SearchResultObject: materialized object with its searchable properties
//! - KeywordSearchRequest: an autocomplete query

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a searchable object
///
/// Object ids are assigned by whatever system owns the objects. The index
/// only stores and intersects them; it never creates them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub i64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ObjectId {
    fn from(id: i64) -> Self {
        ObjectId(id)
    }
}

/// Identifier of an object type
///
/// Searches are scoped by type when objects are materialized.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectTypeId(pub u32);

impl fmt::Display for ObjectTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Shard identifier of the keyword index
///
/// A pure function of a keyword (see `kwindex_search::chunk_key`). Several
/// keywords share a chunk; a chunk is authoritative only for the keywords it
/// was built from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChunkKey(pub u32);

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk.{}", self.0)
    }
}

/// One shard of the keyword index in its transport form
///
/// Chunks are produced wholesale by the indexer: a newer chunk for the same
/// key fully replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedChunk {
    /// Shard this chunk belongs to
    pub chunk_key: ChunkKey,
    /// base64 of the zstd-compressed JSON row array
    pub encoded_data: String,
    /// Content hash of `encoded_data`, used to skip redundant updates
    pub encoded_hash: String,
    /// Opaque version marker set by the indexer
    pub last_update: String,
}

/// An object returned by a search
///
/// Owned by the object cache. The index reads `properties` during
/// verification and otherwise passes the object through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultObject {
    /// Object identifier
    pub id: ObjectId,
    /// Type the object belongs to
    pub object_type_id: ObjectTypeId,
    /// Searchable properties: property name -> value
    pub properties: BTreeMap<String, String>,
}

impl SearchResultObject {
    /// Create an object with no properties
    pub fn new(id: impl Into<ObjectId>, object_type_id: ObjectTypeId) -> Self {
        SearchResultObject {
            id: id.into(),
            object_type_id,
            properties: BTreeMap::new(),
        }
    }

    /// Builder: add a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// An autocomplete search request
///
/// # Example
///
/// ```
/// use kwindex_core::{KeywordSearchRequest, ObjectTypeId};
///
/// let req = KeywordSearchRequest::new("pump stat", ObjectTypeId(1)).with_property("name");
///
/// assert_eq!(req.search_string, "pump stat");
/// assert_eq!(req.property_name.as_deref(), Some("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSearchRequest {
    /// Raw text typed by the user
    pub search_string: String,

    /// Type scope for materialized objects
    pub object_type_id: ObjectTypeId,

    /// Optional: restrict matching to one property
    pub property_name: Option<String>,
}

impl KeywordSearchRequest {
    /// Create a request that matches against all properties
    pub fn new(search_string: impl Into<String>, object_type_id: ObjectTypeId) -> Self {
        KeywordSearchRequest {
            search_string: search_string.into(),
            object_type_id,
            property_name: None,
        }
    }

    /// Builder: restrict matching to a single property
    ///
    /// Property names are case-insensitive; the name is lowercased here.
    pub fn with_property(mut self, property_name: impl Into<String>) -> Self {
        self.property_name = Some(property_name.into().to_lowercase());
        self
    }
}
