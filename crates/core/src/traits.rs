//! External collaborator traits
//!
//! The keyword index does not own objects or chunk storage. It reaches both
//! through these traits, which are called from blocking worker threads, so
//! implementations may block on I/O.

use crate::error::CollaboratorError;
use crate::types::{ChunkKey, EncodedChunk, ObjectId, ObjectTypeId, SearchResultObject};

/// Materializes objects by id
pub trait ObjectCache: Send + Sync {
    /// Whether `object_type_id` names a known object type
    ///
    /// Searches for unknown types fail with `Error::UnknownObjectType`
    /// before any index work is done.
    fn knows_object_type(&self, object_type_id: ObjectTypeId) -> bool;

    /// Fetch the objects for `ids` within `object_type_id`
    ///
    /// The result may be in any order. Ids without a live object are omitted,
    /// not reported as errors.
    fn get_objects(
        &self,
        object_type_id: ObjectTypeId,
        ids: &[ObjectId],
    ) -> Result<Vec<SearchResultObject>, CollaboratorError>;
}

/// Delivers the current version of an encoded chunk
pub trait ChunkCache: Send + Sync {
    /// Current chunk for `chunk_key`, or `None` if the key has no chunk
    fn encoded_chunk(&self, chunk_key: ChunkKey)
        -> Result<Option<EncodedChunk>, CollaboratorError>;
}
