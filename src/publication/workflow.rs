//! Thin orchestration over the publication gate for the two supported
//! targets (department, commune): target-kind validation, delegation, and
//! response shaping.

use serde::{Deserialize, Serialize};

use crate::database::{CelRow, HistoryRow, ResultsDatabase, ZoneRow};
use crate::hierarchy;
use crate::model::ZoneType;
use crate::publication::{PublicationError, PublicationGate, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub code: String,
    pub label: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<i64>,
    #[serde(rename = "publicationStatus")]
    pub publication_status: String,
}

impl From<&ZoneRow> for ZoneSummary {
    fn from(zone: &ZoneRow) -> Self {
        Self {
            id: zone.id,
            zone_type: zone.zone_type.clone(),
            code: zone.code.clone(),
            label: zone.label.clone(),
            parent_id: zone.parent_id,
            // Canonical enum spelling, whatever the store held.
            publication_status: zone.publication_status().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelStatusEntry {
    pub code: String,
    pub label: String,
    #[serde(rename = "importStatus")]
    pub import_status: String,
    pub pending: bool,
}

impl From<&CelRow> for CelStatusEntry {
    fn from(cel: &CelRow) -> Self {
        Self {
            code: cel.code.clone(),
            label: cel.label.clone(),
            import_status: cel.import_status().as_str().to_string(),
            pending: cel.import_status().is_pending(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: String,
    #[serde(rename = "actorId")]
    pub actor_id: String,
    pub note: Option<String>,
    pub timestamp: String,
}

impl From<&HistoryRow> for HistoryEntry {
    fn from(row: &HistoryRow) -> Self {
        Self {
            action: row.action.clone(),
            actor_id: row.actor_id.clone(),
            note: row.note.clone(),
            timestamp: row.created_at.clone(),
        }
    }
}

/// Response of a publish/cancel action: the updated zone, its refreshed
/// cell list, and a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationOutcome {
    pub zone: ZoneSummary,
    pub cels: Vec<CelStatusEntry>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDetails {
    pub zone: ZoneSummary,
    pub cels: Vec<CelStatusEntry>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone)]
pub struct PublicationWorkflow {
    db: ResultsDatabase,
    gate: PublicationGate,
}

impl PublicationWorkflow {
    pub fn new(db: ResultsDatabase) -> Self {
        let gate = PublicationGate::new(db.clone());
        Self { db, gate }
    }

    pub async fn publish_department(
        &self,
        zone_id: i64,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<PublicationOutcome> {
        self.expect_kind(zone_id, ZoneType::Department).await?;
        let zone = self.gate.publish(zone_id, actor_id, note).await?;
        self.outcome(zone, format!("results published by {actor_id}"))
            .await
    }

    pub async fn publish_commune(
        &self,
        zone_id: i64,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<PublicationOutcome> {
        self.expect_kind(zone_id, ZoneType::Commune).await?;
        let zone = self.gate.publish(zone_id, actor_id, note).await?;
        self.outcome(zone, format!("results published by {actor_id}"))
            .await
    }

    pub async fn cancel_department(
        &self,
        zone_id: i64,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<PublicationOutcome> {
        self.expect_kind(zone_id, ZoneType::Department).await?;
        let zone = self.gate.cancel(zone_id, actor_id, note).await?;
        self.outcome(zone, format!("publication cancelled by {actor_id}"))
            .await
    }

    pub async fn cancel_commune(
        &self,
        zone_id: i64,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<PublicationOutcome> {
        self.expect_kind(zone_id, ZoneType::Commune).await?;
        let zone = self.gate.cancel(zone_id, actor_id, note).await?;
        self.outcome(zone, format!("publication cancelled by {actor_id}"))
            .await
    }

    /// Zone summary, cell list with per-cell status, and the full
    /// publish/cancel history.
    pub async fn zone_details(&self, zone_id: i64) -> Result<ZoneDetails> {
        let zone = hierarchy::find_zone(&self.db, zone_id).await?;
        match zone.zone_type() {
            Some(ZoneType::Department) | Some(ZoneType::Commune) => {}
            _ => {
                return Err(PublicationError::InvalidTarget(format!(
                    "{} is not a department or commune",
                    zone.label
                )))
            }
        }

        let cels = self.cels_of(zone.id).await?;
        let history = self
            .db
            .history_for_zone(zone.id)
            .await?
            .iter()
            .map(HistoryEntry::from)
            .collect();

        Ok(ZoneDetails {
            zone: ZoneSummary::from(&zone),
            cels,
            history,
        })
    }

    async fn expect_kind(&self, zone_id: i64, expected: ZoneType) -> Result<()> {
        let zone = hierarchy::find_zone(&self.db, zone_id).await?;
        if zone.zone_type() != Some(expected) {
            return Err(PublicationError::InvalidTarget(format!(
                "{} is a {}, expected {}",
                zone.label, zone.zone_type, expected
            )));
        }
        Ok(())
    }

    async fn outcome(&self, zone: ZoneRow, message: String) -> Result<PublicationOutcome> {
        let cels = self.cels_of(zone.id).await?;
        Ok(PublicationOutcome {
            zone: ZoneSummary::from(&zone),
            cels,
            message,
        })
    }

    async fn cels_of(&self, zone_id: i64) -> Result<Vec<CelStatusEntry>> {
        let grouped = self.db.cels_for_zones(&[zone_id]).await?;
        Ok(grouped
            .get(&zone_id)
            .map(|list| list.iter().map(CelStatusEntry::from).collect())
            .unwrap_or_default())
    }
}
