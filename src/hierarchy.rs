//! Zone hierarchy resolution: zone-type inference from query parameters,
//! the metropolitan-department expansion, and batched subtree walks down to
//! polling-station granularity.

use itertools::Itertools;

use crate::database::{DatabaseError, ResultsDatabase, ZoneRow};
use crate::model::{ZoneSelector, ZoneType};

/// The one department that is never an addressable publication unit on its
/// own; everywhere it would appear, its communes stand in for it.
pub const METROPOLITAN_DEPARTMENT_CODE: &str = "022";

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Invalid zone request: {0}")]
    InvalidZone(String),
    #[error("Zone not found: {0}")]
    ZoneNotFound(i64),
}

pub type Result<T> = std::result::Result<T, HierarchyError>;

/// Zone type selected by a by-zone query, decided by the most specific
/// identifier present.
pub fn resolve_zone_type(selector: &ZoneSelector) -> Result<(ZoneType, i64)> {
    selector.most_specific().ok_or_else(|| {
        HierarchyError::InvalidZone(
            "one of regionId, departmentId, votingPlaceId, pollingStationId is required"
                .to_string(),
        )
    })
}

/// Load a zone or fail with `ZoneNotFound`.
pub async fn find_zone(db: &ResultsDatabase, id: i64) -> Result<ZoneRow> {
    db.zone_by_id(id)
        .await?
        .ok_or(HierarchyError::ZoneNotFound(id))
}

pub fn is_metropolitan(zone: &ZoneRow) -> bool {
    zone.zone_type() == Some(ZoneType::Department) && zone.code == METROPOLITAN_DEPARTMENT_CODE
}

/// Expand a department into its addressable publication units.
///
/// The metropolitan department yields its distinct communes (deduplicated by
/// label — several communes can share a numeric code after sub-prefecture
/// splits); any other department yields itself as a singleton.
pub async fn expand_department_zone(
    db: &ResultsDatabase,
    department: &ZoneRow,
) -> Result<Vec<ZoneRow>> {
    if !is_metropolitan(department) {
        return Ok(vec![department.clone()]);
    }
    let communes = db
        .zones_by_parent_ids(&[department.id])
        .await?
        .into_iter()
        .filter(|z| z.zone_type() == Some(ZoneType::Commune))
        .unique_by(|z| z.label.clone())
        .collect();
    Ok(communes)
}

/// Code-based variant of [`expand_department_zone`] kept for callers that
/// only hold a department code. Short codes can be ambiguous; the first
/// match (by label order) is used and the ambiguity is logged downstream.
pub async fn expand_department(db: &ResultsDatabase, code: &str) -> Result<Vec<ZoneRow>> {
    let matches = db.zones_by_code(ZoneType::Department, code).await?;
    let department = matches
        .into_iter()
        .next()
        .ok_or_else(|| HierarchyError::InvalidZone(format!("unknown department code {code}")))?;
    expand_department_zone(db, &department).await
}

/// All addressable publication units: every regular department plus the
/// communes of the metropolitan department.
pub async fn publication_units(db: &ResultsDatabase) -> Result<Vec<ZoneRow>> {
    let departments = db.zones_by_type(ZoneType::Department).await?;
    let mut units = Vec::new();
    for department in &departments {
        units.extend(expand_department_zone(db, department).await?);
    }
    units.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(units)
}

/// A polling station reached by a subtree walk, with the context the
/// aggregation engine needs: the voting place above it, the publication
/// unit that gates its result figures, and which immediate child of the
/// walk root it descends from.
#[derive(Debug, Clone)]
pub struct StationContext {
    pub station: ZoneRow,
    pub voting_place_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub unit_published: bool,
    pub top_child_id: Option<i64>,
}

#[derive(Clone)]
struct WalkState {
    top_child_id: Option<i64>,
    unit: Option<(i64, bool)>,
    voting_place_id: Option<i64>,
}

/// Walk the subtree of `root` down to polling stations, level by level with
/// one batched child query per level.
pub async fn station_contexts(
    db: &ResultsDatabase,
    root: &ZoneRow,
) -> Result<Vec<StationContext>> {
    // For a root below unit or voting-place level, the gating unit and the
    // voting place come from the ancestor chain.
    let chain = ancestor_chain(db, root).await?;
    let inherited_unit = unit_in_chain(&chain);
    let inherited_vp = chain
        .iter()
        .find(|z| z.zone_type() == Some(ZoneType::VotingPlace))
        .map(|z| z.id);
    walk(db, std::slice::from_ref(root), inherited_unit, inherited_vp, true).await
}

/// National-scope walk over every region at once. Registration sums stay
/// cheap because child fetches are batched across all frontier zones.
pub async fn national_station_contexts(db: &ResultsDatabase) -> Result<Vec<StationContext>> {
    let regions = db.zones_by_type(ZoneType::Region).await?;
    walk(db, &regions, None, None, false).await
}

async fn walk(
    db: &ResultsDatabase,
    roots: &[ZoneRow],
    inherited_unit: Option<(i64, bool)>,
    inherited_vp: Option<i64>,
    track_top_child: bool,
) -> Result<Vec<StationContext>> {
    let mut contexts = Vec::new();
    // (zone, state); the frontier holds one level at a time.
    let mut frontier: Vec<(ZoneRow, WalkState)> = Vec::new();

    for root in roots {
        // `inherited_unit` comes from an upward walk that already considered
        // the root itself, so it is authoritative here.
        let state = WalkState {
            top_child_id: None,
            unit: inherited_unit,
            voting_place_id: inherited_vp,
        };
        if root.zone_type() == Some(ZoneType::PollingStation) {
            contexts.push(make_context(root.clone(), &state));
        } else {
            frontier.push((root.clone(), state));
        }
    }

    while !frontier.is_empty() {
        let parent_ids: Vec<i64> = frontier.iter().map(|(z, _)| z.id).collect();
        let children = db.zones_by_parent_ids(&parent_ids).await?;

        let mut next = Vec::with_capacity(children.len());
        for child in children {
            let Some((parent, parent_state)) = frontier
                .iter()
                .find(|(z, _)| Some(z.id) == child.parent_id)
            else {
                continue;
            };

            let mut state = parent_state.clone();
            if track_top_child && state.top_child_id.is_none() {
                state.top_child_id = Some(child.id);
            }
            if let Some(unit) = unit_for(&child, Some(parent)) {
                state.unit = Some(unit);
            }
            if child.zone_type() == Some(ZoneType::VotingPlace) {
                state.voting_place_id = Some(child.id);
            }

            if child.zone_type() == Some(ZoneType::PollingStation) {
                contexts.push(make_context(child, &state));
            } else {
                next.push((child, state));
            }
        }
        frontier = next;
    }

    Ok(contexts)
}

fn make_context(station: ZoneRow, state: &WalkState) -> StationContext {
    StationContext {
        station,
        voting_place_id: state.voting_place_id,
        unit_id: state.unit.map(|(id, _)| id),
        unit_published: state.unit.map(|(_, published)| published).unwrap_or(false),
        top_child_id: state.top_child_id,
    }
}

/// Is this zone itself a publication unit? A regular department always is;
/// a commune is one when it sits under the metropolitan department.
fn unit_for(zone: &ZoneRow, parent: Option<&ZoneRow>) -> Option<(i64, bool)> {
    match zone.zone_type() {
        Some(ZoneType::Department) if !is_metropolitan(zone) => {
            Some((zone.id, zone.publication_status().is_published()))
        }
        Some(ZoneType::Commune) => {
            let under_metro = parent.map(is_metropolitan).unwrap_or(false);
            if under_metro || parent.is_none() {
                Some((zone.id, zone.publication_status().is_published()))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// The publication unit gating a zone's result figures, with its current
/// published flag. `None` for zones above unit level (regions, the
/// metropolitan department itself).
pub async fn owning_unit(db: &ResultsDatabase, zone: &ZoneRow) -> Result<Option<(i64, bool)>> {
    resolve_unit_upward(db, zone).await
}

/// For a walk rooted below unit level (voting place, polling station, or a
/// commune), find the gating unit among its ancestors.
async fn resolve_unit_upward(
    db: &ResultsDatabase,
    zone: &ZoneRow,
) -> Result<Option<(i64, bool)>> {
    let chain = ancestor_chain(db, zone).await?;
    Ok(unit_in_chain(&chain))
}

/// First publication unit in a self-then-ancestors chain.
fn unit_in_chain(chain: &[ZoneRow]) -> Option<(i64, bool)> {
    for (index, link) in chain.iter().enumerate() {
        let parent = chain.get(index + 1);
        if let Some(unit) = unit_for(link, parent) {
            return Some(unit);
        }
    }
    None
}

/// The zone itself followed by its ancestors up to the root.
pub async fn ancestor_chain(db: &ResultsDatabase, zone: &ZoneRow) -> Result<Vec<ZoneRow>> {
    let mut chain = vec![zone.clone()];
    let mut parent_id = zone.parent_id;
    while let Some(id) = parent_id {
        let parent = find_zone(db, id).await?;
        parent_id = parent.parent_id;
        chain.push(parent);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testutil::{test_db, Fixture};

    #[test]
    fn selector_resolution() {
        let selector = ZoneSelector {
            department: Some(4),
            polling_station: Some(12),
            ..Default::default()
        };
        assert!(matches!(
            resolve_zone_type(&selector),
            Ok((ZoneType::PollingStation, 12))
        ));

        let err = resolve_zone_type(&ZoneSelector::default()).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidZone(_)));
    }

    #[tokio::test]
    async fn metropolitan_department_expands_to_distinct_communes() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        // A second COCODY row with a different code: same label, must
        // deduplicate away.
        db.insert_zone(ZoneType::Commune, "10B", "COCODY", Some(fx.metro))
            .await
            .unwrap();

        let metro = find_zone(&db, fx.metro).await.unwrap();
        let expanded = expand_department_zone(&db, &metro).await.unwrap();
        let labels: Vec<&str> = expanded.iter().map(|z| z.label.as_str()).collect();
        assert_eq!(labels, vec!["COCODY", "YOPOUGON"]);
    }

    #[tokio::test]
    async fn regular_department_expands_to_itself() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let dept = find_zone(&db, fx.dept_agboville).await.unwrap();
        let expanded = expand_department_zone(&db, &dept).await.unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].id, fx.dept_agboville);
    }

    #[tokio::test]
    async fn publication_units_replace_metro_with_communes() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let units = publication_units(&db).await.unwrap();
        let ids: Vec<i64> = units.iter().map(|z| z.id).collect();
        assert!(ids.contains(&fx.cocody));
        assert!(ids.contains(&fx.yopougon));
        assert!(ids.contains(&fx.dept_agboville));
        assert!(ids.contains(&fx.dept_man));
        assert!(!ids.contains(&fx.metro), "metro department is not a unit");
    }

    #[tokio::test]
    async fn station_contexts_assign_units_and_gating() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let region = find_zone(&db, fx.region).await.unwrap();
        let contexts = station_contexts(&db, &region).await.unwrap();
        assert_eq!(contexts.len(), 4);

        let ctx = |station: i64| {
            contexts
                .iter()
                .find(|c| c.station.id == station)
                .expect("station in walk")
        };
        assert_eq!(ctx(fx.st_cocody_1).unit_id, Some(fx.cocody));
        assert!(ctx(fx.st_cocody_1).unit_published);
        assert_eq!(ctx(fx.st_yopougon).unit_id, Some(fx.yopougon));
        assert!(!ctx(fx.st_yopougon).unit_published);
        assert_eq!(ctx(fx.st_agboville).unit_id, Some(fx.dept_agboville));
        assert!(ctx(fx.st_agboville).unit_published);
    }

    #[tokio::test]
    async fn walk_from_voting_place_inherits_unit_from_ancestors() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let vp = find_zone(&db, fx.vp_cocody).await.unwrap();
        let contexts = station_contexts(&db, &vp).await.unwrap();
        assert_eq!(contexts.len(), 2);
        for ctx in &contexts {
            assert_eq!(ctx.unit_id, Some(fx.cocody));
            assert!(ctx.unit_published);
            assert_eq!(ctx.voting_place_id, Some(fx.vp_cocody));
        }
    }

    #[tokio::test]
    async fn national_walk_covers_every_region() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let contexts = national_station_contexts(&db).await.unwrap();
        assert_eq!(contexts.len(), 5);
        assert!(contexts.iter().any(|c| c.station.id == fx.st_man));
    }
}
