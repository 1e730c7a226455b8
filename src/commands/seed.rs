//! Demonstration dataset: a compact two-region hierarchy with one
//! metropolitan department, enough to exercise every read and mutation
//! command against a real file database.

use std::path::Path;

use colored::*;

use crate::commands::{open_database, CommandResult};
use crate::database::{schema, NewImportRecord};
use crate::hierarchy::METROPOLITAN_DEPARTMENT_CODE;
use crate::model::{ImportStatus, ZoneType};

pub async fn seed_demo(database: &Path) -> CommandResult {
    let db = open_database(database, true).await?;
    schema::create_schema(db.pool()).await?;

    println!(
        "🚀 Seeding demo dataset into {}",
        database.display().to_string().bright_cyan()
    );

    let candidates = [
        (1, "K. ADJOUA", "RDP"),
        (2, "M. BROU", "PUN"),
        (3, "S. KONE", "MIL"),
        (4, "A. DIOMANDE", "UDC"),
        (5, "F. N'GUESSAN", "IND"),
    ];
    for (ordinal, name, party) in candidates {
        db.insert_candidate(ordinal, name, Some(party), None).await?;
    }

    let lagunes = db.insert_zone(ZoneType::Region, "01", "LAGUNES", None).await?;
    let montagnes = db
        .insert_zone(ZoneType::Region, "02", "MONTAGNES", None)
        .await?;

    // The metropolitan department: addressed only through its communes.
    let metro = db
        .insert_zone(
            ZoneType::Department,
            METROPOLITAN_DEPARTMENT_CODE,
            "ABIDJAN",
            Some(lagunes),
        )
        .await?;
    let cocody = db
        .insert_zone(ZoneType::Commune, "10", "COCODY", Some(metro))
        .await?;
    let yopougon = db
        .insert_zone(ZoneType::Commune, "14", "YOPOUGON", Some(metro))
        .await?;

    let agboville = db
        .insert_zone(ZoneType::Department, "023", "AGBOVILLE", Some(lagunes))
        .await?;
    let man = db
        .insert_zone(ZoneType::Department, "033", "MAN", Some(montagnes))
        .await?;

    let cel_cocody = db
        .insert_cel("CEL-ABJ-10", "CEL COCODY", ImportStatus::Processed, cocody)
        .await?;
    db.insert_cel(
        "CEL-ABJ-14",
        "CEL YOPOUGON",
        ImportStatus::NotImported,
        yopougon,
    )
    .await?;
    let cel_agboville = db
        .insert_cel(
            "CEL-AGB-01",
            "CEL AGBOVILLE",
            ImportStatus::Imported,
            agboville,
        )
        .await?;
    db.insert_cel("CEL-MAN-01", "CEL MAN", ImportStatus::NotImported, man)
        .await?;

    let mut stations = 0usize;
    for (unit, cel, vp_code, vp_label, tallies) in [
        (
            cocody,
            Some(cel_cocody),
            "001",
            "EPP COCODY CENTRE",
            vec![(500, 300, 10, 5, [150, 100, 20, 10, 5]), (400, 200, 0, 0, [100, 60, 20, 15, 5])],
        ),
        (
            yopougon,
            None,
            "002",
            "EPP YOPOUGON SIDECI",
            vec![(450, 0, 0, 0, [0, 0, 0, 0, 0])],
        ),
        (
            agboville,
            Some(cel_agboville),
            "003",
            "LYCEE AGBOVILLE",
            vec![(600, 360, 20, 10, [200, 80, 30, 15, 5])],
        ),
        (
            man,
            None,
            "004",
            "EPP MAN 1",
            vec![(300, 0, 0, 0, [0, 0, 0, 0, 0])],
        ),
    ] {
        let vp = db
            .insert_zone(ZoneType::VotingPlace, vp_code, vp_label, Some(unit))
            .await?;
        for (index, (inscrits, votants, nuls, blancs, scores)) in tallies.iter().enumerate() {
            let code = format!("{:02}", index + 1);
            let label = format!("BUREAU {code}");
            let station = db
                .insert_zone(ZoneType::PollingStation, &code, &label, Some(vp))
                .await?;
            db.insert_station_stats(station, *inscrits, inscrits / 2, inscrits - inscrits / 2, *votants)
                .await?;
            stations += 1;

            let Some(cel_id) = cel else {
                continue;
            };
            if *votants == 0 {
                continue;
            }
            let votants_s = votants.to_string();
            let nuls_s = nuls.to_string();
            let blancs_s = blancs.to_string();
            let scores_s: Vec<String> = scores.iter().map(|s| s.to_string()).collect();
            db.insert_import_record(&NewImportRecord {
                cel_id,
                station_id: station,
                total_votants: Some(&votants_s),
                bulletins_nuls: Some(&nuls_s),
                bulletins_blancs: Some(&blancs_s),
                scores: [
                    Some(scores_s[0].as_str()),
                    Some(scores_s[1].as_str()),
                    Some(scores_s[2].as_str()),
                    Some(scores_s[3].as_str()),
                    Some(scores_s[4].as_str()),
                ],
                statut: Some("PROCESSED"),
                imported_at: Some("2025-10-27T10:00:00+00:00"),
                ..Default::default()
            })
            .await?;
        }
    }

    println!(
        "✅ Seeded 2 regions, 4 publication units, {} polling stations, {} candidates",
        stations.to_string().bright_yellow(),
        candidates.len().to_string().bright_yellow()
    );
    println!(
        "   Try: {} then {}",
        "publish commune <cocody-id>".bright_white(),
        "summary".bright_white()
    );
    Ok(())
}
