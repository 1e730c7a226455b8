use crate::database::{DatabaseError, Result};
/// Database schema definitions and integrity checks.
use sqlx::SqlitePool;

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Administrative hierarchy. publication_status is only meaningful for
    // DEPARTMENT and COMMUNE rows; historical imports may have left any of
    // the tolerated status spellings in it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            id INTEGER PRIMARY KEY,
            zone_type TEXT NOT NULL,
            code TEXT NOT NULL,
            label TEXT NOT NULL,
            parent_id INTEGER,
            publication_status TEXT NOT NULL DEFAULT 'PENDING',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (parent_id) REFERENCES zones(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Electoral cells, each owned by the department or commune it reports
    // into.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cels (
            id INTEGER PRIMARY KEY,
            code TEXT UNIQUE NOT NULL,
            label TEXT NOT NULL,
            import_status TEXT NOT NULL DEFAULT 'NOT_IMPORTED',
            zone_id INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (zone_id) REFERENCES zones(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Canonical per-station registration and total-voters figures.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stations (
            zone_id INTEGER PRIMARY KEY,
            inscrits INTEGER NOT NULL DEFAULT 0,
            population_hommes INTEGER NOT NULL DEFAULT 0,
            population_femmes INTEGER NOT NULL DEFAULT 0,
            votants INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (zone_id) REFERENCES zones(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id INTEGER PRIMARY KEY,
            ordinal INTEGER UNIQUE NOT NULL,
            name TEXT NOT NULL,
            party TEXT,
            photo_url TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Raw rows as written by the ingestion pipeline: string-typed counts,
    // one row per polling station per CEL, duplicates across re-imports.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_records (
            id INTEGER PRIMARY KEY,
            cel_id INTEGER NOT NULL,
            station_id INTEGER NOT NULL,
            population TEXT,
            votants_hommes TEXT,
            votants_femmes TEXT,
            total_votants TEXT,
            bulletins_nuls TEXT,
            bulletins_blancs TEXT,
            suffrage_exprime TEXT,
            score_1 TEXT,
            score_2 TEXT,
            score_3 TEXT,
            score_4 TEXT,
            score_5 TEXT,
            statut TEXT,
            imported_at TIMESTAMP,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (cel_id) REFERENCES cels(id),
            FOREIGN KEY (station_id) REFERENCES zones(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only publish/cancel audit trail.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS publication_history (
            id INTEGER PRIMARY KEY,
            zone_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            note TEXT,
            created_at TIMESTAMP NOT NULL,
            FOREIGN KEY (zone_id) REFERENCES zones(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_zones_parent ON zones(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_zones_type_code ON zones(zone_type, code)",
        "CREATE INDEX IF NOT EXISTS idx_cels_zone ON cels(zone_id)",
        "CREATE INDEX IF NOT EXISTS idx_import_records_station ON import_records(station_id)",
        "CREATE INDEX IF NOT EXISTS idx_import_records_cel_station ON import_records(cel_id, station_id)",
        "CREATE INDEX IF NOT EXISTS idx_history_zone ON publication_history(zone_id)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}

/// Verify database schema integrity.
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(pool)
            .await?;

    let expected_tables = vec![
        "candidates",
        "cels",
        "import_records",
        "publication_history",
        "stations",
        "zones",
    ];

    for expected in &expected_tables {
        if !tables.iter().any(|name| name == expected) {
            return Err(DatabaseError::Integrity(format!(
                "Missing table: {}",
                expected
            )));
        }
    }

    Ok(())
}
