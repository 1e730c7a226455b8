//! Publication state gate: the publish/cancel transition rules, the
//! pending-import precondition, and the append-only audit trail.

pub mod workflow;

pub use workflow::PublicationWorkflow;

use crate::database::{DatabaseError, ResultsDatabase, ZoneRow};
use crate::hierarchy::{self, HierarchyError};
use crate::model::PublicationStatus;

#[derive(Debug, thiserror::Error)]
pub enum PublicationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Hierarchy(#[from] HierarchyError),
    #[error("Publication forbidden: {0}")]
    Forbidden(String),
    #[error("{count} electoral cell(s) still awaiting import")]
    PendingImports { count: u64 },
    #[error("Invalid publication target: {0}")]
    InvalidTarget(String),
}

pub type Result<T> = std::result::Result<T, PublicationError>;

pub const ACTION_PUBLISH: &str = "PUBLISH";
pub const ACTION_CANCEL: &str = "CANCEL";

/// Gatekeeper for per-zone publication state.
///
/// Concurrency note: two actors publishing/cancelling the same zone race as
/// last-writer-wins; both history rows are recorded and the visible status
/// is whichever UPDATE ran last. There is no optimistic-concurrency token
/// at the store layer.
#[derive(Clone)]
pub struct PublicationGate {
    db: ResultsDatabase,
}

impl PublicationGate {
    pub fn new(db: ResultsDatabase) -> Self {
        Self { db }
    }

    /// True iff the zone's stored status normalizes into the
    /// published-equivalent set.
    pub fn is_zone_published(zone: &ZoneRow) -> bool {
        zone.publication_status().is_published()
    }

    /// Number of cells owned by this zone that still block publication.
    pub async fn pending_cel_count(&self, zone_id: i64) -> Result<u64> {
        let cels = self.db.cels_for_zones(&[zone_id]).await?;
        let pending = cels
            .get(&zone_id)
            .map(|list| {
                list.iter()
                    .filter(|cel| cel.import_status().is_pending())
                    .count() as u64
            })
            .unwrap_or(0);
        Ok(pending)
    }

    /// Publish a department or commune.
    ///
    /// Re-publishing an already published zone re-validates the
    /// preconditions and re-writes the status; this is intentional so a
    /// zone can be re-confirmed after late imports.
    pub async fn publish(
        &self,
        zone_id: i64,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<ZoneRow> {
        let zone = hierarchy::find_zone(&self.db, zone_id).await?;

        if hierarchy::is_metropolitan(&zone) {
            return Err(PublicationError::Forbidden(format!(
                "{} cannot be published as a whole; publish its communes individually",
                zone.label
            )));
        }

        let pending = self.pending_cel_count(zone.id).await?;
        if pending > 0 {
            return Err(PublicationError::PendingImports { count: pending });
        }

        self.write_status(&zone, PublicationStatus::Published, ACTION_PUBLISH, actor_id, note)
            .await
    }

    /// Cancel a zone's publication. Always allowed, from any state; the
    /// pending-import check does not apply.
    pub async fn cancel(
        &self,
        zone_id: i64,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<ZoneRow> {
        let zone = hierarchy::find_zone(&self.db, zone_id).await?;
        self.write_status(&zone, PublicationStatus::Cancelled, ACTION_CANCEL, actor_id, note)
            .await
    }

    /// The status change commits independently of audit success: a failed
    /// history append is logged and swallowed, never rolled back.
    async fn write_status(
        &self,
        zone: &ZoneRow,
        status: PublicationStatus,
        action: &str,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<ZoneRow> {
        self.db.set_publication_status(zone.id, status).await?;

        if let Err(err) = self.db.append_history(zone.id, action, actor_id, note).await {
            tracing::warn!(
                zone_id = zone.id,
                action,
                error = %err,
                "failed to append publication history; status change stands"
            );
        }

        Ok(hierarchy::find_zone(&self.db, zone.id).await?)
    }
}
