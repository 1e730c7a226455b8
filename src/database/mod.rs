pub mod schema;
#[cfg(test)]
pub mod testutil;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::model::{ImportStatus, PublicationStatus, ZoneType};

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Data integrity error: {0}")]
    Integrity(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Access layer over the results store.
///
/// Every read here is batched: callers pass the full list of zone ids they
/// care about and get grouped rows back, so no query fans out per zone.
#[derive(Clone)]
pub struct ResultsDatabase {
    pool: SqlitePool,
    query_count: Arc<AtomicU64>,
}

impl ResultsDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(Self {
            pool,
            query_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// In-memory store for tests. Pinned to a single connection: every
    /// SQLite `:memory:` connection is its own empty database, so a wider
    /// pool would scatter the schema.
    pub async fn create_in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self {
            pool,
            query_count: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of store round-trips issued through this handle. Used by the
    /// cache tests and exposed in debug logging.
    pub fn queries_run(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }

    fn note_query(&self) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
    }

    // ---- zone reads ----

    pub async fn zone_by_id(&self, id: i64) -> Result<Option<ZoneRow>> {
        self.note_query();
        let row = sqlx::query_as::<_, ZoneRow>(
            r#"
            SELECT id, zone_type, code, label, parent_id, publication_status
            FROM zones
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn zones_by_ids(&self, ids: &[i64]) -> Result<Vec<ZoneRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.note_query();
        let sql = format!(
            r#"
            SELECT id, zone_type, code, label, parent_id, publication_status
            FROM zones
            WHERE id IN ({})
            ORDER BY label
            "#,
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, ZoneRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Children of every zone in `parent_ids`, in a single query.
    pub async fn zones_by_parent_ids(&self, parent_ids: &[i64]) -> Result<Vec<ZoneRow>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.note_query();
        let sql = format!(
            r#"
            SELECT id, zone_type, code, label, parent_id, publication_status
            FROM zones
            WHERE parent_id IN ({})
            ORDER BY label
            "#,
            placeholders(parent_ids.len())
        );
        let mut query = sqlx::query_as::<_, ZoneRow>(&sql);
        for id in parent_ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn zones_by_type(&self, zone_type: ZoneType) -> Result<Vec<ZoneRow>> {
        self.note_query();
        let rows = sqlx::query_as::<_, ZoneRow>(
            r#"
            SELECT id, zone_type, code, label, parent_id, publication_status
            FROM zones
            WHERE zone_type = ?
            ORDER BY label
            "#,
        )
        .bind(zone_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Deprecated short-code lookup. Several communes can share a numeric
    /// code (sub-prefecture splits), so this can return more than one row;
    /// callers should prefer id-based lookup and treat a multi-row result
    /// as ambiguous.
    pub async fn zones_by_code(&self, zone_type: ZoneType, code: &str) -> Result<Vec<ZoneRow>> {
        self.note_query();
        let rows = sqlx::query_as::<_, ZoneRow>(
            r#"
            SELECT id, zone_type, code, label, parent_id, publication_status
            FROM zones
            WHERE zone_type = ? AND code = ?
            ORDER BY label
            "#,
        )
        .bind(zone_type.as_str())
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        if rows.len() > 1 {
            tracing::warn!(
                zone_type = zone_type.as_str(),
                code,
                matches = rows.len(),
                "ambiguous short-code zone lookup; use id-based lookup instead"
            );
        }
        Ok(rows)
    }

    // ---- electoral cells ----

    /// All cells owned by the given publication units, grouped by owning
    /// zone id. One query regardless of how many zones are asked for.
    pub async fn cels_for_zones(&self, zone_ids: &[i64]) -> Result<HashMap<i64, Vec<CelRow>>> {
        if zone_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.note_query();
        let sql = format!(
            r#"
            SELECT id, code, label, import_status, zone_id
            FROM cels
            WHERE zone_id IN ({})
            ORDER BY code
            "#,
            placeholders(zone_ids.len())
        );
        let mut query = sqlx::query_as::<_, CelRow>(&sql);
        for id in zone_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<CelRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.zone_id).or_default().push(row);
        }
        Ok(grouped)
    }

    // ---- polling station tallies ----

    /// Canonical registration and total-voters figures for the given
    /// polling stations.
    pub async fn station_stats_for(&self, station_ids: &[i64]) -> Result<Vec<StationStatsRow>> {
        if station_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.note_query();
        let sql = format!(
            r#"
            SELECT zone_id, inscrits, population_hommes, population_femmes, votants
            FROM stations
            WHERE zone_id IN ({})
            "#,
            placeholders(station_ids.len())
        );
        let mut query = sqlx::query_as::<_, StationStatsRow>(&sql);
        for id in station_ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Every import record for the given stations, re-imports included.
    /// The caller picks one record per (cel, station) pair.
    pub async fn import_records_for_stations(
        &self,
        station_ids: &[i64],
    ) -> Result<Vec<ImportRecordRow>> {
        if station_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.note_query();
        let sql = format!(
            r#"
            SELECT id, cel_id, station_id, population, votants_hommes, votants_femmes,
                   total_votants, bulletins_nuls, bulletins_blancs, suffrage_exprime,
                   score_1, score_2, score_3, score_4, score_5, statut, imported_at
            FROM import_records
            WHERE station_id IN ({})
            ORDER BY station_id, id
            "#,
            placeholders(station_ids.len())
        );
        let mut query = sqlx::query_as::<_, ImportRecordRow>(&sql);
        for id in station_ids {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// (stations with at least one import record, total stations).
    pub async fn station_processing_counts(&self) -> Result<(i64, i64)> {
        self.note_query();
        let processed: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT station_id) FROM import_records")
                .fetch_one(&self.pool)
                .await?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM zones WHERE zone_type = 'POLLING_STATION'")
                .fetch_one(&self.pool)
                .await?;
        Ok((processed, total))
    }

    // ---- candidates ----

    pub async fn all_candidates(&self) -> Result<Vec<CandidateRow>> {
        self.note_query();
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, ordinal, name, party, photo_url
            FROM candidates
            ORDER BY ordinal
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ---- publication state ----

    pub async fn set_publication_status(
        &self,
        zone_id: i64,
        status: PublicationStatus,
    ) -> Result<u64> {
        self.note_query();
        let result = sqlx::query("UPDATE zones SET publication_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(zone_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn append_history(
        &self,
        zone_id: i64,
        action: &str,
        actor_id: &str,
        note: Option<&str>,
    ) -> Result<()> {
        self.note_query();
        let created_at = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO publication_history (zone_id, action, actor_id, note, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(zone_id)
        .bind(action)
        .bind(actor_id)
        .bind(note)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn history_for_zone(&self, zone_id: i64) -> Result<Vec<HistoryRow>> {
        self.note_query();
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, zone_id, action, actor_id, note, created_at
            FROM publication_history
            WHERE zone_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ---- writes used by schema bootstrap and the demo seeder ----
    // The real ingestion pipeline is an external process; these exist so the
    // crate can stand up a working store on its own.

    pub async fn insert_zone(
        &self,
        zone_type: ZoneType,
        code: &str,
        label: &str,
        parent_id: Option<i64>,
    ) -> Result<i64> {
        self.note_query();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO zones (zone_type, code, label, parent_id)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(zone_type.as_str())
        .bind(code)
        .bind(label)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_cel(
        &self,
        code: &str,
        label: &str,
        import_status: ImportStatus,
        zone_id: i64,
    ) -> Result<i64> {
        self.note_query();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cels (code, label, import_status, zone_id)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(label)
        .bind(import_status.as_str())
        .bind(zone_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_candidate(
        &self,
        ordinal: i64,
        name: &str,
        party: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<i64> {
        self.note_query();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO candidates (ordinal, name, party, photo_url)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(ordinal)
        .bind(name)
        .bind(party)
        .bind(photo_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_station_stats(
        &self,
        zone_id: i64,
        inscrits: i64,
        population_hommes: i64,
        population_femmes: i64,
        votants: i64,
    ) -> Result<()> {
        self.note_query();
        sqlx::query(
            r#"
            INSERT INTO stations (zone_id, inscrits, population_hommes, population_femmes, votants)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(zone_id) DO UPDATE SET
                inscrits = excluded.inscrits,
                population_hommes = excluded.population_hommes,
                population_femmes = excluded.population_femmes,
                votants = excluded.votants
            "#,
        )
        .bind(zone_id)
        .bind(inscrits)
        .bind(population_hommes)
        .bind(population_femmes)
        .bind(votants)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_import_record(&self, record: &NewImportRecord<'_>) -> Result<i64> {
        self.note_query();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO import_records
                (cel_id, station_id, population, votants_hommes, votants_femmes,
                 total_votants, bulletins_nuls, bulletins_blancs, suffrage_exprime,
                 score_1, score_2, score_3, score_4, score_5, statut, imported_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(record.cel_id)
        .bind(record.station_id)
        .bind(record.population)
        .bind(record.votants_hommes)
        .bind(record.votants_femmes)
        .bind(record.total_votants)
        .bind(record.bulletins_nuls)
        .bind(record.bulletins_blancs)
        .bind(record.suffrage_exprime)
        .bind(record.scores[0])
        .bind(record.scores[1])
        .bind(record.scores[2])
        .bind(record.scores[3])
        .bind(record.scores[4])
        .bind(record.statut)
        .bind(record.imported_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZoneRow {
    pub id: i64,
    pub zone_type: String,
    pub code: String,
    pub label: String,
    pub parent_id: Option<i64>,
    pub publication_status: String,
}

impl ZoneRow {
    pub fn zone_type(&self) -> Option<ZoneType> {
        ZoneType::from_raw(&self.zone_type)
    }

    pub fn publication_status(&self) -> PublicationStatus {
        PublicationStatus::from_raw(&self.publication_status)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CelRow {
    pub id: i64,
    pub code: String,
    pub label: String,
    pub import_status: String,
    pub zone_id: i64,
}

impl CelRow {
    pub fn import_status(&self) -> ImportStatus {
        ImportStatus::from_raw(&self.import_status)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StationStatsRow {
    pub zone_id: i64,
    pub inscrits: i64,
    pub population_hommes: i64,
    pub population_femmes: i64,
    pub votants: i64,
}

/// One raw row written by the ingestion pipeline; counts are kept as the
/// strings it wrote, parsing happens at aggregation time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRecordRow {
    pub id: i64,
    pub cel_id: i64,
    pub station_id: i64,
    pub population: Option<String>,
    pub votants_hommes: Option<String>,
    pub votants_femmes: Option<String>,
    pub total_votants: Option<String>,
    pub bulletins_nuls: Option<String>,
    pub bulletins_blancs: Option<String>,
    pub suffrage_exprime: Option<String>,
    pub score_1: Option<String>,
    pub score_2: Option<String>,
    pub score_3: Option<String>,
    pub score_4: Option<String>,
    pub score_5: Option<String>,
    pub statut: Option<String>,
    pub imported_at: Option<String>,
}

impl ImportRecordRow {
    pub fn score(&self, ordinal: usize) -> &Option<String> {
        match ordinal {
            1 => &self.score_1,
            2 => &self.score_2,
            3 => &self.score_3,
            4 => &self.score_4,
            _ => &self.score_5,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub ordinal: i64,
    pub name: String,
    pub party: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub zone_id: i64,
    pub action: String,
    pub actor_id: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// Insert payload for a raw import row (demo seeding and tests).
#[derive(Debug, Default)]
pub struct NewImportRecord<'a> {
    pub cel_id: i64,
    pub station_id: i64,
    pub population: Option<&'a str>,
    pub votants_hommes: Option<&'a str>,
    pub votants_femmes: Option<&'a str>,
    pub total_votants: Option<&'a str>,
    pub bulletins_nuls: Option<&'a str>,
    pub bulletins_blancs: Option<&'a str>,
    pub suffrage_exprime: Option<&'a str>,
    pub scores: [Option<&'a str>; 5],
    pub statut: Option<&'a str>,
    pub imported_at: Option<&'a str>,
}
