//! Identity and timestamp bookkeeping shared by all entities.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle timestamps embedded in every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EntityMetadata {
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inserted_at: now,
            updated_at: now,
        }
    }

    /// Marks the entity as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// An object with a business identity and modification tracking.
pub trait Entity {
    /// Business identifier (product id, box id, order id).
    fn id(&self) -> &str;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    fn touch(&mut self) {
        self.metadata_mut().touch();
    }
}
