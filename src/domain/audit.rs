//! Audit timestamps, soft-delete flag and per-entity deletion policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation / update / deletion bookkeeping carried by every mutable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last modified, if ever.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the row was soft-deleted, if ever.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Soft-delete flag. Deleted rows only show up in trash queries.
    pub is_deleted: bool,
}

impl AuditFields {
    /// Fresh audit fields stamped at `now`.
    #[must_use]
    pub const fn created(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: None,
            deleted_at: None,
            is_deleted: false,
        }
    }

    /// Records a modification.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    /// Flags the row as deleted.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(now);
    }
}

impl Default for AuditFields {
    fn default() -> Self {
        Self::created(Utc::now())
    }
}

/// How an entity type is removed from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Flag + timestamp; the row is retained and visible to trash queries.
    Soft,
    /// Physical removal, cascading to owned rows.
    Hard,
}

/// Entities that can be removed through a unit of work.
///
/// The policy is fixed per type so that no call site can pick a different
/// deletion semantic than the one the entity declares.
pub trait Deletable {
    /// Removal semantic for this entity type.
    const POLICY: DeletionPolicy;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_deleted_sets_flag_and_timestamp() {
        let now = Utc::now();
        let mut audit = AuditFields::created(now);
        assert!(!audit.is_deleted);

        audit.mark_deleted(now);
        assert!(audit.is_deleted);
        assert_eq!(audit.deleted_at, Some(now));
    }

    #[test]
    fn touch_only_updates_updated_at() {
        let now = Utc::now();
        let mut audit = AuditFields::created(now);
        audit.touch(now);
        assert_eq!(audit.updated_at, Some(now));
        assert!(audit.deleted_at.is_none());
    }
}
