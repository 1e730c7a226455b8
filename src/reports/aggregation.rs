//! Aggregation engine: walks a zone's subtree down to polling stations,
//! sums registration figures ungated and result figures from the published
//! subset only, and produces per-child breakdowns.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::database::{ResultsDatabase, StationStatsRow, ZoneRow};
use crate::hierarchy::{self, StationContext};
use crate::model::ZoneType;
use crate::reports::ranking::select_record;
use crate::reports::{AggregatedStatistics, ReportResult};

/// Subtree totals for one zone: the statistics plus the raw per-ordinal
/// candidate scores the ranking engine consumes.
#[derive(Debug, Clone, Default)]
pub struct ZoneAggregate {
    pub statistics: AggregatedStatistics,
    pub scores: [u64; 5],
}

#[derive(Debug)]
pub struct BreakdownEntry {
    pub zone: ZoneRow,
    pub aggregate: ZoneAggregate,
}

/// Tolerant parse of a raw string-typed count. The ingestion pipeline writes
/// counts as strings, sometimes with grouping spaces; anything unparseable
/// counts as zero.
pub(crate) fn parse_count(raw: &Option<String>) -> u64 {
    raw.as_deref()
        .map(|s| {
            s.trim()
                .replace([' ', '\u{a0}'], "")
                .parse::<u64>()
                .unwrap_or(0)
        })
        .unwrap_or(0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Result figures of the one record selected for a station, already parsed.
#[derive(Debug, Clone, Copy, Default)]
struct StationResults {
    votants: u64,
    nuls: u64,
    blancs: u64,
    exprimes: u64,
    scores: [u64; 5],
}

/// Everything the summing pass needs, fetched in two batched queries.
struct StationData {
    stats: HashMap<i64, StationStatsRow>,
    results: HashMap<i64, StationResults>,
}

async fn load_station_data(
    db: &ResultsDatabase,
    contexts: &[StationContext],
) -> ReportResult<StationData> {
    let all_ids: Vec<i64> = contexts.iter().map(|c| c.station.id).collect();
    let published_ids: Vec<i64> = contexts
        .iter()
        .filter(|c| c.unit_published)
        .map(|c| c.station.id)
        .collect();

    let stats: HashMap<i64, StationStatsRow> = db
        .station_stats_for(&all_ids)
        .await?
        .into_iter()
        .map(|row| (row.zone_id, row))
        .collect();

    let records = db.import_records_for_stations(&published_ids).await?;

    // Re-imports leave several rows per (cel, station); exactly one per pair
    // is scored, chosen against the station's canonical total-voters figure.
    let mut by_pair: BTreeMap<(i64, i64), Vec<&crate::database::ImportRecordRow>> =
        BTreeMap::new();
    for record in &records {
        by_pair
            .entry((record.cel_id, record.station_id))
            .or_default()
            .push(record);
    }

    let mut results: HashMap<i64, StationResults> = HashMap::new();
    for ((_cel_id, station_id), candidates) in by_pair {
        let canonical = stats.get(&station_id).map(|row| row.votants);
        let Some(record) = select_record(&candidates, canonical) else {
            continue;
        };

        let votants = parse_count(&record.total_votants);
        let nuls = parse_count(&record.bulletins_nuls);
        let blancs = parse_count(&record.bulletins_blancs);
        let entry = results.entry(station_id).or_default();
        entry.votants += votants;
        entry.nuls += nuls;
        entry.blancs += blancs;
        // Valid ballots are always recomputed; the raw suffrage_exprime
        // column is not trusted.
        entry.exprimes += votants.saturating_sub(nuls).saturating_sub(blancs);
        for ordinal in 1..=5 {
            entry.scores[ordinal - 1] += parse_count(record.score(ordinal));
        }
    }

    Ok(StationData { stats, results })
}

fn summarize(contexts: &[&StationContext], data: &StationData) -> ZoneAggregate {
    let mut aggregate = ZoneAggregate::default();
    let stats = &mut aggregate.statistics;
    let mut voting_places: HashSet<i64> = HashSet::new();
    let mut units: HashSet<i64> = HashSet::new();

    for ctx in contexts {
        // Registration figures are public whatever the publication state.
        if let Some(row) = data.stats.get(&ctx.station.id) {
            stats.inscrits += row.inscrits.max(0) as u64;
            stats.population_hommes += row.population_hommes.max(0) as u64;
            stats.population_femmes += row.population_femmes.max(0) as u64;
        }

        if !ctx.unit_published {
            continue;
        }
        let Some(results) = data.results.get(&ctx.station.id) else {
            continue;
        };

        stats.votants += results.votants;
        stats.nuls += results.nuls;
        stats.blancs += results.blancs;
        stats.exprimes += results.exprimes;
        stats.nombre_bureaux += 1;
        if let Some(vp) = ctx.voting_place_id {
            voting_places.insert(vp);
        }
        if let Some(unit) = ctx.unit_id {
            units.insert(unit);
        }
        for ordinal in 0..5 {
            aggregate.scores[ordinal] += results.scores[ordinal];
        }
    }

    stats.nombre_lieux_vote = voting_places.len() as u64;
    stats.nombre_departements = units.len() as u64;
    stats.taux_participation = if stats.inscrits == 0 {
        0.0
    } else {
        round2(stats.votants as f64 / stats.inscrits as f64 * 100.0)
    };

    aggregate
}

/// Aggregate the whole subtree of `root`.
pub async fn aggregate_zone(db: &ResultsDatabase, root: &ZoneRow) -> ReportResult<ZoneAggregate> {
    let contexts = hierarchy::station_contexts(db, root).await?;
    let data = load_station_data(db, &contexts).await?;
    let refs: Vec<&StationContext> = contexts.iter().collect();
    Ok(summarize(&refs, &data))
}

/// National aggregate across every region.
pub async fn aggregate_national(db: &ResultsDatabase) -> ReportResult<ZoneAggregate> {
    let contexts = hierarchy::national_station_contexts(db).await?;
    let data = load_station_data(db, &contexts).await?;
    let refs: Vec<&StationContext> = contexts.iter().collect();
    Ok(summarize(&refs, &data))
}

/// Aggregate `root` and produce one breakdown entry per immediate child —
/// one level only, the children are not broken down further.
///
/// For a region the children shown are its publication units, so the
/// metropolitan department appears as its communes, never as itself.
pub async fn aggregate_with_breakdown(
    db: &ResultsDatabase,
    root: &ZoneRow,
) -> ReportResult<(ZoneAggregate, Vec<BreakdownEntry>)> {
    let contexts = hierarchy::station_contexts(db, root).await?;
    let data = load_station_data(db, &contexts).await?;

    let refs: Vec<&StationContext> = contexts.iter().collect();
    let total = summarize(&refs, &data);

    let group_by_unit = root.zone_type() == Some(ZoneType::Region);
    let mut groups: BTreeMap<i64, Vec<&StationContext>> = BTreeMap::new();
    for ctx in &contexts {
        let key = if group_by_unit {
            ctx.unit_id
        } else {
            ctx.top_child_id
        };
        if let Some(key) = key {
            groups.entry(key).or_default().push(ctx);
        }
    }

    let keys: Vec<i64> = groups.keys().copied().collect();
    let zones = db.zones_by_ids(&keys).await?;

    let mut breakdown = Vec::with_capacity(zones.len());
    for zone in zones {
        let Some(members) = groups.get(&zone.id) else {
            continue;
        };
        breakdown.push(BreakdownEntry {
            aggregate: summarize(members, &data),
            zone,
        });
    }

    Ok((total, breakdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testutil::{test_db, Fixture};
    use crate::database::NewImportRecord;

    #[tokio::test]
    async fn polling_station_scenario() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let station = hierarchy::find_zone(&db, fx.st_cocody_1).await.unwrap();
        let aggregate = aggregate_zone(&db, &station).await.unwrap();
        let stats = &aggregate.statistics;

        assert_eq!(stats.inscrits, 500);
        assert_eq!(stats.votants, 300);
        assert_eq!(stats.nuls, 10);
        assert_eq!(stats.blancs, 5);
        assert_eq!(stats.exprimes, 285);
        assert_eq!(stats.taux_participation, 60.00);
        assert_eq!(stats.nombre_bureaux, 1);
        assert_eq!(aggregate.scores, [150, 100, 20, 10, 5]);
    }

    #[tokio::test]
    async fn unpublished_branches_contribute_zero_results() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        // MAN has an import record, but its department is unpublished.
        let dept = hierarchy::find_zone(&db, fx.dept_man).await.unwrap();
        let aggregate = aggregate_zone(&db, &dept).await.unwrap();
        let stats = &aggregate.statistics;

        assert_eq!(stats.inscrits, 300, "registration figures are ungated");
        assert_eq!(stats.votants, 0);
        assert_eq!(stats.exprimes, 0);
        assert_eq!(stats.nombre_bureaux, 0);
        assert_eq!(stats.taux_participation, 0.0);
        assert_eq!(aggregate.scores, [0; 5]);
    }

    #[tokio::test]
    async fn national_totals_exclude_unpublished_results() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let aggregate = aggregate_national(&db).await.unwrap();
        let stats = &aggregate.statistics;

        assert_eq!(stats.inscrits, 2250);
        assert_eq!(stats.votants, 860);
        assert_eq!(stats.nuls, 30);
        assert_eq!(stats.blancs, 15);
        assert_eq!(stats.exprimes, 815);
        assert_eq!(stats.nombre_bureaux, 3);
        assert_eq!(stats.nombre_lieux_vote, 2);
        assert_eq!(stats.nombre_departements, 2);
        assert_eq!(stats.taux_participation, round2(860.0 / 2250.0 * 100.0));
        assert_eq!(aggregate.scores, [450, 240, 70, 40, 15]);
    }

    #[tokio::test]
    async fn region_inscrits_equal_sum_of_children() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let region = hierarchy::find_zone(&db, fx.region).await.unwrap();
        let (total, breakdown) = aggregate_with_breakdown(&db, &region).await.unwrap();

        let child_sum: u64 = breakdown
            .iter()
            .map(|entry| entry.aggregate.statistics.inscrits)
            .sum();
        assert_eq!(total.statistics.inscrits, child_sum);
        assert_eq!(total.statistics.inscrits, 1950);

        // Region breakdown lists publication units: the metropolitan
        // department shows up as its communes.
        let ids: Vec<i64> = breakdown.iter().map(|entry| entry.zone.id).collect();
        assert!(ids.contains(&fx.cocody));
        assert!(ids.contains(&fx.yopougon));
        assert!(ids.contains(&fx.dept_agboville));
        assert!(!ids.contains(&fx.metro));
    }

    #[tokio::test]
    async fn reimported_records_are_not_double_counted() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        // A later re-import with a diverging total; the canonical 300 row
        // must keep winning selection.
        db.insert_import_record(&NewImportRecord {
            cel_id: fx.cel_cocody,
            station_id: fx.st_cocody_1,
            total_votants: Some("305"),
            bulletins_nuls: Some("12"),
            bulletins_blancs: Some("6"),
            scores: [Some("152"), Some("101"), Some("21"), Some("11"), Some("6")],
            statut: Some("IMPORTED"),
            imported_at: Some("2025-10-28T08:00:00+00:00"),
            ..Default::default()
        })
        .await
        .unwrap();

        let station = hierarchy::find_zone(&db, fx.st_cocody_1).await.unwrap();
        let aggregate = aggregate_zone(&db, &station).await.unwrap();
        assert_eq!(aggregate.statistics.votants, 300);
        assert_eq!(aggregate.scores, [150, 100, 20, 10, 5]);
    }

    #[tokio::test]
    async fn commune_breakdown_lists_voting_places() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let commune = hierarchy::find_zone(&db, fx.cocody).await.unwrap();
        let (total, breakdown) = aggregate_with_breakdown(&db, &commune).await.unwrap();

        assert_eq!(total.statistics.inscrits, 900);
        assert_eq!(total.statistics.votants, 500);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].zone.id, fx.vp_cocody);
        assert_eq!(breakdown[0].aggregate.statistics.nombre_bureaux, 2);
    }

    #[test]
    fn parse_count_tolerates_pipeline_noise() {
        assert_eq!(parse_count(&Some("1 234".to_string())), 1234);
        assert_eq!(parse_count(&Some(" 42".to_string())), 42);
        assert_eq!(parse_count(&Some("".to_string())), 0);
        assert_eq!(parse_count(&Some("n/a".to_string())), 0);
        assert_eq!(parse_count(&None), 0);
    }
}
