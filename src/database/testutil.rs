//! Shared store fixture for unit tests: an in-memory database with a small
//! two-region hierarchy, one metropolitan department split into communes,
//! and raw import rows for the published branches.

use crate::database::schema::create_schema;
use crate::database::{NewImportRecord, ResultsDatabase};
use crate::hierarchy::METROPOLITAN_DEPARTMENT_CODE;
use crate::model::{ImportStatus, ZoneType};

pub async fn test_db() -> ResultsDatabase {
    let db = ResultsDatabase::create_in_memory()
        .await
        .expect("in-memory database");
    create_schema(db.pool()).await.expect("schema");
    db
}

pub struct Fixture {
    pub region: i64,
    pub region2: i64,
    pub metro: i64,
    pub cocody: i64,
    pub yopougon: i64,
    pub dept_agboville: i64,
    pub dept_man: i64,
    pub vp_cocody: i64,
    pub st_cocody_1: i64,
    pub st_cocody_2: i64,
    pub vp_yopougon: i64,
    pub st_yopougon: i64,
    pub vp_agboville: i64,
    pub st_agboville: i64,
    pub vp_man: i64,
    pub st_man: i64,
    pub cel_cocody: i64,
    pub cel_yopougon: i64,
    pub cel_agboville: i64,
    pub cel_man: i64,
}

impl Fixture {
    /// Seed the standard hierarchy.
    ///
    /// Publication state: COCODY published (legacy `PUBLIE` spelling),
    /// AGBOVILLE published (canonical), YOPOUGON and MAN pending.
    /// Registration total across all stations is 2250; published-branch
    /// votants total 860.
    pub async fn seed(db: &ResultsDatabase) -> Self {
        let region = zone(db, ZoneType::Region, "01", "LAGUNES", None).await;
        let region2 = zone(db, ZoneType::Region, "02", "MONTAGNES", None).await;

        let metro = zone(
            db,
            ZoneType::Department,
            METROPOLITAN_DEPARTMENT_CODE,
            "ABIDJAN",
            Some(region),
        )
        .await;
        let cocody = zone(db, ZoneType::Commune, "10", "COCODY", Some(metro)).await;
        let yopougon = zone(db, ZoneType::Commune, "14", "YOPOUGON", Some(metro)).await;
        let dept_agboville =
            zone(db, ZoneType::Department, "023", "AGBOVILLE", Some(region)).await;
        let dept_man = zone(db, ZoneType::Department, "033", "MAN", Some(region2)).await;

        let vp_cocody = zone(
            db,
            ZoneType::VotingPlace,
            "001",
            "EPP COCODY CENTRE",
            Some(cocody),
        )
        .await;
        let st_cocody_1 =
            zone(db, ZoneType::PollingStation, "01", "BUREAU 01", Some(vp_cocody)).await;
        let st_cocody_2 =
            zone(db, ZoneType::PollingStation, "02", "BUREAU 02", Some(vp_cocody)).await;

        let vp_yopougon = zone(
            db,
            ZoneType::VotingPlace,
            "002",
            "EPP YOPOUGON SIDECI",
            Some(yopougon),
        )
        .await;
        let st_yopougon =
            zone(db, ZoneType::PollingStation, "01", "BUREAU 01", Some(vp_yopougon)).await;

        let vp_agboville = zone(
            db,
            ZoneType::VotingPlace,
            "003",
            "LYCEE AGBOVILLE",
            Some(dept_agboville),
        )
        .await;
        let st_agboville =
            zone(db, ZoneType::PollingStation, "01", "BUREAU 01", Some(vp_agboville)).await;

        let vp_man = zone(db, ZoneType::VotingPlace, "004", "EPP MAN 1", Some(dept_man)).await;
        let st_man = zone(db, ZoneType::PollingStation, "01", "BUREAU 01", Some(vp_man)).await;

        // Canonical station tallies (inscrits are public regardless of
        // publication state).
        stats(db, st_cocody_1, 500, 240, 260, 300).await;
        stats(db, st_cocody_2, 400, 190, 210, 200).await;
        stats(db, st_yopougon, 450, 220, 230, 0).await;
        stats(db, st_agboville, 600, 310, 290, 360).await;
        stats(db, st_man, 300, 160, 140, 150).await;

        let cel_cocody = db
            .insert_cel("CEL-COCODY", "CEL COCODY", ImportStatus::Processed, cocody)
            .await
            .expect("cel");
        let cel_yopougon = db
            .insert_cel(
                "CEL-YOPOUGON",
                "CEL YOPOUGON",
                ImportStatus::NotImported,
                yopougon,
            )
            .await
            .expect("cel");
        let cel_agboville = db
            .insert_cel(
                "CEL-AGBOVILLE",
                "CEL AGBOVILLE",
                ImportStatus::Imported,
                dept_agboville,
            )
            .await
            .expect("cel");
        let cel_man = db
            .insert_cel("CEL-MAN", "CEL MAN", ImportStatus::NotImported, dept_man)
            .await
            .expect("cel");

        for (ordinal, name, party) in [
            (1, "K. ADJOUA", "RDP"),
            (2, "M. BROU", "PUN"),
            (3, "S. KONE", "MIL"),
            (4, "A. DIOMANDE", "UDC"),
            (5, "F. N'GUESSAN", "IND"),
        ] {
            db.insert_candidate(ordinal, name, Some(party), None)
                .await
                .expect("candidate");
        }

        record(
            db,
            cel_cocody,
            st_cocody_1,
            "300",
            "10",
            "5",
            ["150", "100", "20", "10", "5"],
            "PROCESSED",
            "2025-10-27T10:00:00+00:00",
        )
        .await;
        record(
            db,
            cel_cocody,
            st_cocody_2,
            "200",
            "0",
            "0",
            ["100", "60", "20", "15", "5"],
            "PROCESSED",
            "2025-10-27T10:05:00+00:00",
        )
        .await;
        record(
            db,
            cel_agboville,
            st_agboville,
            "360",
            "20",
            "10",
            ["200", "80", "30", "15", "5"],
            "IMPORTED",
            "2025-10-27T11:00:00+00:00",
        )
        .await;
        // MAN has data but its department is unpublished; these figures must
        // never leak into aggregates.
        record(
            db,
            cel_man,
            st_man,
            "150",
            "5",
            "5",
            ["50", "50", "30", "5", "5"],
            "IMPORTED",
            "2025-10-27T12:00:00+00:00",
        )
        .await;

        set_raw_status(db, cocody, "PUBLIE").await;
        set_raw_status(db, dept_agboville, "PUBLISHED").await;

        Self {
            region,
            region2,
            metro,
            cocody,
            yopougon,
            dept_agboville,
            dept_man,
            vp_cocody,
            st_cocody_1,
            st_cocody_2,
            vp_yopougon,
            st_yopougon,
            vp_agboville,
            st_agboville,
            vp_man,
            st_man,
            cel_cocody,
            cel_yopougon,
            cel_agboville,
            cel_man,
        }
    }
}

async fn zone(
    db: &ResultsDatabase,
    zone_type: ZoneType,
    code: &str,
    label: &str,
    parent: Option<i64>,
) -> i64 {
    db.insert_zone(zone_type, code, label, parent)
        .await
        .expect("zone insert")
}

async fn stats(
    db: &ResultsDatabase,
    station: i64,
    inscrits: i64,
    hommes: i64,
    femmes: i64,
    votants: i64,
) {
    db.insert_station_stats(station, inscrits, hommes, femmes, votants)
        .await
        .expect("station stats insert")
}

#[allow(clippy::too_many_arguments)]
async fn record(
    db: &ResultsDatabase,
    cel_id: i64,
    station_id: i64,
    votants: &str,
    nuls: &str,
    blancs: &str,
    scores: [&str; 5],
    statut: &str,
    imported_at: &str,
) {
    db.insert_import_record(&NewImportRecord {
        cel_id,
        station_id,
        total_votants: Some(votants),
        bulletins_nuls: Some(nuls),
        bulletins_blancs: Some(blancs),
        scores: scores.map(Some),
        statut: Some(statut),
        imported_at: Some(imported_at),
        ..Default::default()
    })
    .await
    .expect("import record insert");
}

/// Write a raw status string directly, bypassing the gate, to simulate
/// legacy values left behind by earlier systems.
pub async fn set_raw_status(db: &ResultsDatabase, zone_id: i64, raw: &str) {
    sqlx::query("UPDATE zones SET publication_status = ? WHERE id = ?")
        .bind(raw)
        .bind(zone_id)
        .execute(db.pool())
        .await
        .expect("status update");
}
