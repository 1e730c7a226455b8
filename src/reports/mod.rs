//! Read side of the engine: aggregated statistics, ranked results, and the
//! published-zone listings, served through the short-TTL result cache.

use serde::{Deserialize, Serialize};

use crate::cache::{cache_key, ResultCache};
use crate::database::{CandidateRow, DatabaseError, ResultsDatabase, ZoneRow};
use crate::hierarchy::{self, HierarchyError};
use crate::model::{ZoneSelector, ZoneType};
use crate::publication::PublicationGate;

pub mod aggregation;
pub mod ranking;

use aggregation::{aggregate_national, aggregate_with_breakdown};
use ranking::rank_candidates;

pub const DEFAULT_ELECTION_ID: &str = "pres-2025";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Hierarchy(#[from] HierarchyError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Zone not published: {0}")]
    NotPublished(String),
    #[error("Invalid zone request: {0}")]
    InvalidZone(String),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Derived turnout and validity figures for one zone's subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStatistics {
    pub inscrits: u64,
    pub votants: u64,
    #[serde(rename = "tauxParticipation")]
    pub taux_participation: f64,
    pub blancs: u64,
    pub nuls: u64,
    pub exprimes: u64,
    #[serde(rename = "populationHommes")]
    pub population_hommes: u64,
    #[serde(rename = "populationFemmes")]
    pub population_femmes: u64,
    #[serde(rename = "nombreBureaux")]
    pub nombre_bureaux: u64,
    #[serde(rename = "nombreLieuxVote")]
    pub nombre_lieux_vote: u64,
    #[serde(rename = "nombreDepartements")]
    pub nombre_departements: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    #[serde(rename = "candidateId")]
    pub candidate_id: i64,
    pub name: String,
    pub party: Option<String>,
    pub votes: u64,
    pub percentage: f64,
    pub rank: u32,
    #[serde(rename = "isWinner")]
    pub is_winner: bool,
    #[serde(rename = "isTied")]
    pub is_tied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRef {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub code: String,
    pub label: String,
    pub parent: Option<ZoneRef>,
}

/// National header block: headline turnout plus the published zone labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderSummary {
    pub inscrits: u64,
    pub votants: u64,
    #[serde(rename = "tauxParticipation")]
    pub taux_participation: f64,
    #[serde(rename = "zonesPubliees")]
    pub zones_publiees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    #[serde(rename = "bureauxTraites")]
    pub bureaux_traites: i64,
    #[serde(rename = "bureauxTotal")]
    pub bureaux_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub code: String,
    pub label: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub zone: ZoneInfo,
    pub statistics: AggregatedStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneResults {
    pub zone: ZoneInfo,
    pub statistics: AggregatedStatistics,
    pub results: Vec<CandidateResult>,
    pub breakdown: Vec<BreakdownRow>,
}

/// By-zone response. A department-level request for the metropolitan
/// department never yields a single department aggregate; it expands into
/// one entry per distinct commune.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneResultsResponse {
    Zone(Box<ZoneResults>),
    Communes(Vec<ZoneResults>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDetail {
    pub id: i64,
    pub ordinal: i64,
    pub name: String,
    pub party: Option<String>,
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,
}

/// Roster entry with its current national score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedCandidate {
    pub id: i64,
    pub ordinal: i64,
    pub name: String,
    pub party: Option<String>,
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,
    pub votes: u64,
    pub percentage: f64,
    pub rank: u32,
    #[serde(rename = "isWinner")]
    pub is_winner: bool,
    #[serde(rename = "isTied")]
    pub is_tied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullResults {
    pub candidates: Vec<CandidateDetail>,
    pub statistics: AggregatedStatistics,
    pub results: Vec<CandidateResult>,
    pub processing: ProcessingStats,
    pub tree: Vec<TreeNode>,
}

/// Read-side entry point. All endpoints go through the result cache; a
/// publish/cancel does not invalidate entries, they age out with the TTL.
pub struct ResultsReporter {
    db: ResultsDatabase,
    cache: ResultCache,
    election_id: String,
}

impl ResultsReporter {
    pub fn new(db: ResultsDatabase, cache: ResultCache, election_id: impl Into<String>) -> Self {
        Self {
            db,
            cache,
            election_id: election_id.into(),
        }
    }

    /// National inscrits/votants/turnout plus the labels of every published
    /// zone.
    pub async fn header_summary(&self) -> ReportResult<HeaderSummary> {
        let key = cache_key(&self.election_id, "NATIONAL", &[("view", "header".into())]);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "result cache hit");
            return Ok(serde_json::from_str(&hit)?);
        }

        let aggregate = aggregate_national(&self.db).await?;
        let zones_publiees = hierarchy::publication_units(&self.db)
            .await?
            .iter()
            .filter(|unit| PublicationGate::is_zone_published(unit))
            .map(|unit| unit.label.clone())
            .collect();

        let summary = HeaderSummary {
            inscrits: aggregate.statistics.inscrits,
            votants: aggregate.statistics.votants,
            taux_participation: aggregate.statistics.taux_participation,
            zones_publiees,
        };

        self.cache.set(key, serde_json::to_string(&summary)?);
        Ok(summary)
    }

    /// Full national payload: roster, totals, ranked results, processing
    /// progress, and the published results tree.
    pub async fn full_results(&self) -> ReportResult<FullResults> {
        let key = cache_key(&self.election_id, "NATIONAL", &[("view", "full".into())]);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "result cache hit");
            return Ok(serde_json::from_str(&hit)?);
        }

        let roster = self.db.all_candidates().await?;
        let aggregate = aggregate_national(&self.db).await?;
        let results = rank_candidates(&roster, &aggregate.scores, aggregate.statistics.exprimes);
        let (bureaux_traites, bureaux_total) = self.db.station_processing_counts().await?;
        let tree = self.build_published_tree().await?;

        let full = FullResults {
            candidates: roster.iter().map(candidate_detail).collect(),
            statistics: aggregate.statistics,
            results,
            processing: ProcessingStats {
                bureaux_traites,
                bureaux_total,
            },
            tree,
        };

        self.cache.set(key, serde_json::to_string(&full)?);
        Ok(full)
    }

    /// Statistics and ranked results for one zone, selected by exactly one
    /// of the four identifiers.
    pub async fn results_by_zone(
        &self,
        selector: &ZoneSelector,
    ) -> ReportResult<ZoneResultsResponse> {
        let (selected_type, zone_id) = hierarchy::resolve_zone_type(selector)?;

        let key = cache_key(
            &self.election_id,
            selected_type.as_str(),
            &[("zoneId", zone_id.to_string())],
        );
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "result cache hit");
            return Ok(serde_json::from_str(&hit)?);
        }

        let zone = hierarchy::find_zone(&self.db, zone_id).await?;
        check_selected_kind(&zone, selected_type)?;

        let response = if hierarchy::is_metropolitan(&zone) {
            let communes = hierarchy::expand_department_zone(&self.db, &zone).await?;
            let mut entries = Vec::with_capacity(communes.len());
            for commune in &communes {
                entries.push(self.zone_results(commune).await?);
            }
            ZoneResultsResponse::Communes(entries)
        } else {
            // Everything below region level is only visible once its owning
            // department or commune is published.
            if selected_type != ZoneType::Region {
                let unit = hierarchy::owning_unit(&self.db, &zone).await?;
                if !matches!(unit, Some((_, true))) {
                    return Err(ReportError::NotPublished(zone.label.clone()));
                }
            }
            ZoneResultsResponse::Zone(Box::new(self.zone_results(&zone).await?))
        };

        self.cache.set(key, serde_json::to_string(&response)?);
        Ok(response)
    }

    /// Compatibility lookup by department short code instead of internal
    /// id. Short codes can be ambiguous (the store logs a warning when they
    /// are); id-based selection via [`Self::results_by_zone`] is preferred.
    pub async fn results_by_department_code(
        &self,
        code: &str,
    ) -> ReportResult<ZoneResultsResponse> {
        let key = cache_key(
            &self.election_id,
            ZoneType::Department.as_str(),
            &[("departmentCode", code.to_string())],
        );
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "result cache hit");
            return Ok(serde_json::from_str(&hit)?);
        }

        let units = hierarchy::expand_department(&self.db, code).await?;
        let response = match units.as_slice() {
            [unit] if unit.zone_type() == Some(ZoneType::Department) => {
                let selector = ZoneSelector {
                    department: Some(unit.id),
                    ..Default::default()
                };
                return self.results_by_zone(&selector).await;
            }
            communes => {
                let mut entries = Vec::with_capacity(communes.len());
                for commune in communes {
                    entries.push(self.zone_results(commune).await?);
                }
                ZoneResultsResponse::Communes(entries)
            }
        };

        self.cache.set(key, serde_json::to_string(&response)?);
        Ok(response)
    }

    /// Region → department-or-commune → voting place → polling station
    /// listing, restricted to published branches.
    pub async fn published_tree(&self) -> ReportResult<Vec<TreeNode>> {
        let key = cache_key(&self.election_id, "NATIONAL", &[("view", "tree".into())]);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "result cache hit");
            return Ok(serde_json::from_str(&hit)?);
        }

        let tree = self.build_published_tree().await?;
        self.cache.set(key, serde_json::to_string(&tree)?);
        Ok(tree)
    }

    /// Candidate roster with party metadata and current national scores.
    pub async fn candidates_detailed(&self) -> ReportResult<Vec<DetailedCandidate>> {
        let key = cache_key(
            &self.election_id,
            "NATIONAL",
            &[("view", "candidates".into())],
        );
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "result cache hit");
            return Ok(serde_json::from_str(&hit)?);
        }

        let roster = self.db.all_candidates().await?;
        let aggregate = aggregate_national(&self.db).await?;
        let ranked = rank_candidates(&roster, &aggregate.scores, aggregate.statistics.exprimes);

        let detailed: Vec<DetailedCandidate> = roster
            .iter()
            .map(|candidate| {
                let result = ranked
                    .iter()
                    .find(|r| r.candidate_id == candidate.id)
                    .cloned();
                let result = result.unwrap_or(CandidateResult {
                    candidate_id: candidate.id,
                    name: candidate.name.clone(),
                    party: candidate.party.clone(),
                    votes: 0,
                    percentage: 0.0,
                    rank: 0,
                    is_winner: false,
                    is_tied: false,
                });
                DetailedCandidate {
                    id: candidate.id,
                    ordinal: candidate.ordinal,
                    name: candidate.name.clone(),
                    party: candidate.party.clone(),
                    photo_url: candidate.photo_url.clone(),
                    votes: result.votes,
                    percentage: result.percentage,
                    rank: result.rank,
                    is_winner: result.is_winner,
                    is_tied: result.is_tied,
                }
            })
            .collect();

        self.cache.set(key, serde_json::to_string(&detailed)?);
        Ok(detailed)
    }

    async fn zone_results(&self, zone: &ZoneRow) -> ReportResult<ZoneResults> {
        let (aggregate, breakdown) = aggregate_with_breakdown(&self.db, zone).await?;
        let roster = self.db.all_candidates().await?;
        let results = rank_candidates(&roster, &aggregate.scores, aggregate.statistics.exprimes);

        let parent = match zone.parent_id {
            Some(parent_id) => self.db.zone_by_id(parent_id).await?.map(|p| ZoneRef {
                id: p.id,
                label: p.label,
            }),
            None => None,
        };

        let zone_info = ZoneInfo {
            id: zone.id,
            zone_type: zone.zone_type.clone(),
            code: zone.code.clone(),
            label: zone.label.clone(),
            parent,
        };

        let breakdown = breakdown
            .into_iter()
            .map(|entry| BreakdownRow {
                zone: ZoneInfo {
                    id: entry.zone.id,
                    zone_type: entry.zone.zone_type.clone(),
                    code: entry.zone.code.clone(),
                    label: entry.zone.label.clone(),
                    parent: Some(ZoneRef {
                        id: zone.id,
                        label: zone.label.clone(),
                    }),
                },
                statistics: entry.aggregate.statistics,
            })
            .collect();

        Ok(ZoneResults {
            zone: zone_info,
            statistics: aggregate.statistics,
            results,
            breakdown,
        })
    }

    async fn build_published_tree(&self) -> ReportResult<Vec<TreeNode>> {
        let regions = self.db.zones_by_type(ZoneType::Region).await?;
        let region_ids: Vec<i64> = regions.iter().map(|z| z.id).collect();
        let departments = self.db.zones_by_parent_ids(&region_ids).await?;

        let metro_ids: Vec<i64> = departments
            .iter()
            .filter(|d| hierarchy::is_metropolitan(d))
            .map(|d| d.id)
            .collect();
        let communes = self.db.zones_by_parent_ids(&metro_ids).await?;

        // Addressable units per region: regular departments directly, the
        // metropolitan department through its communes.
        let mut units_by_region: std::collections::HashMap<i64, Vec<&ZoneRow>> =
            std::collections::HashMap::new();
        for department in &departments {
            let Some(region_id) = department.parent_id else {
                continue;
            };
            if hierarchy::is_metropolitan(department) {
                for commune in communes.iter().filter(|c| c.parent_id == Some(department.id)) {
                    units_by_region.entry(region_id).or_default().push(commune);
                }
            } else {
                units_by_region.entry(region_id).or_default().push(department);
            }
        }

        let published_units: Vec<&ZoneRow> = units_by_region
            .values()
            .flatten()
            .copied()
            .filter(|unit| PublicationGate::is_zone_published(unit))
            .collect();
        let published_ids: Vec<i64> = published_units.iter().map(|u| u.id).collect();

        let voting_places = self.db.zones_by_parent_ids(&published_ids).await?;
        let vp_ids: Vec<i64> = voting_places.iter().map(|v| v.id).collect();
        let stations = self.db.zones_by_parent_ids(&vp_ids).await?;

        let mut tree = Vec::new();
        for region in &regions {
            let Some(region_units) = units_by_region.get(&region.id) else {
                continue;
            };
            let children: Vec<TreeNode> = region_units
                .iter()
                .filter(|unit| PublicationGate::is_zone_published(unit))
                .map(|unit| TreeNode {
                    id: unit.id,
                    zone_type: unit.zone_type.clone(),
                    code: unit.code.clone(),
                    label: unit.label.clone(),
                    children: voting_places
                        .iter()
                        .filter(|vp| vp.parent_id == Some(unit.id))
                        .map(|vp| TreeNode {
                            id: vp.id,
                            zone_type: vp.zone_type.clone(),
                            code: vp.code.clone(),
                            label: vp.label.clone(),
                            children: stations
                                .iter()
                                .filter(|st| st.parent_id == Some(vp.id))
                                .map(|st| TreeNode {
                                    id: st.id,
                                    zone_type: st.zone_type.clone(),
                                    code: st.code.clone(),
                                    label: st.label.clone(),
                                    children: Vec::new(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect();

            if !children.is_empty() {
                tree.push(TreeNode {
                    id: region.id,
                    zone_type: region.zone_type.clone(),
                    code: region.code.clone(),
                    label: region.label.clone(),
                    children,
                });
            }
        }

        Ok(tree)
    }
}

fn candidate_detail(candidate: &CandidateRow) -> CandidateDetail {
    CandidateDetail {
        id: candidate.id,
        ordinal: candidate.ordinal,
        name: candidate.name.clone(),
        party: candidate.party.clone(),
        photo_url: candidate.photo_url.clone(),
    }
}

/// The id supplied under a selector parameter must denote a zone of the
/// matching level. The department parameter also accepts communes, since
/// they share the department-or-commune level of the hierarchy.
fn check_selected_kind(zone: &ZoneRow, selected: ZoneType) -> ReportResult<()> {
    let actual = zone.zone_type();
    let ok = match selected {
        ZoneType::Region => actual == Some(ZoneType::Region),
        ZoneType::Department => {
            actual == Some(ZoneType::Department) || actual == Some(ZoneType::Commune)
        }
        ZoneType::VotingPlace => actual == Some(ZoneType::VotingPlace),
        ZoneType::PollingStation => actual == Some(ZoneType::PollingStation),
        ZoneType::Commune => actual == Some(ZoneType::Commune),
    };
    if ok {
        Ok(())
    } else {
        Err(ReportError::InvalidZone(format!(
            "{} is a {}, not addressable as {}",
            zone.label, zone.zone_type, selected
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testutil::{test_db, Fixture};

    fn reporter(db: &ResultsDatabase) -> ResultsReporter {
        ResultsReporter::new(db.clone(), ResultCache::default(), DEFAULT_ELECTION_ID)
    }

    #[tokio::test]
    async fn header_summary_totals_and_published_labels() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let summary = reporter(&db).header_summary().await.unwrap();
        assert_eq!(summary.inscrits, 2250);
        assert_eq!(summary.votants, 860);
        assert_eq!(summary.taux_participation, 38.22);
        assert_eq!(summary.zones_publiees, vec!["AGBOVILLE", "COCODY"]);
    }

    #[tokio::test]
    async fn repeat_reads_within_ttl_hit_the_cache() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let reporter = reporter(&db);
        let first = reporter.header_summary().await.unwrap();
        let after_first = db.queries_run();

        let second = reporter.header_summary().await.unwrap();
        assert_eq!(db.queries_run(), after_first, "second read must not touch the store");
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn expired_entries_trigger_fresh_aggregation() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let reporter = ResultsReporter::new(
            db.clone(),
            ResultCache::with_ttl(std::time::Duration::from_millis(1)),
            DEFAULT_ELECTION_ID,
        );
        reporter.header_summary().await.unwrap();
        let after_first = db.queries_run();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        reporter.header_summary().await.unwrap();
        assert!(
            db.queries_run() > after_first,
            "expired entry must be recomputed from the store"
        );
    }

    #[tokio::test]
    async fn by_zone_returns_station_results() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let selector = ZoneSelector {
            polling_station: Some(fx.st_cocody_1),
            ..Default::default()
        };
        let response = reporter(&db).results_by_zone(&selector).await.unwrap();
        let ZoneResultsResponse::Zone(results) = response else {
            panic!("expected single-zone response");
        };
        assert_eq!(results.statistics.exprimes, 285);
        assert_eq!(results.statistics.taux_participation, 60.00);
        assert_eq!(results.zone.parent.as_ref().unwrap().id, fx.vp_cocody);
        assert_eq!(results.results[0].votes, 150);
        assert!(results.results[0].is_winner);
    }

    #[tokio::test]
    async fn by_zone_rejects_unpublished_branches() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let selector = ZoneSelector {
            polling_station: Some(fx.st_man),
            ..Default::default()
        };
        let err = reporter(&db).results_by_zone(&selector).await.unwrap_err();
        assert!(matches!(err, ReportError::NotPublished(_)));
    }

    #[tokio::test]
    async fn by_zone_requires_a_selector() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let err = reporter(&db)
            .results_by_zone(&ZoneSelector::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Hierarchy(HierarchyError::InvalidZone(_))
        ));
    }

    #[tokio::test]
    async fn metro_department_request_expands_to_communes() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let selector = ZoneSelector {
            department: Some(fx.metro),
            ..Default::default()
        };
        let response = reporter(&db).results_by_zone(&selector).await.unwrap();
        let ZoneResultsResponse::Communes(entries) = response else {
            panic!("expected commune expansion");
        };
        assert_eq!(entries.len(), 2);

        let cocody = entries.iter().find(|e| e.zone.id == fx.cocody).unwrap();
        assert_eq!(cocody.statistics.votants, 500);
        let yopougon = entries.iter().find(|e| e.zone.id == fx.yopougon).unwrap();
        assert_eq!(yopougon.statistics.votants, 0);
        assert_eq!(yopougon.statistics.inscrits, 450);
    }

    #[tokio::test]
    async fn department_code_lookup_follows_the_expansion() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let reporter = reporter(&db);
        let response = reporter
            .results_by_department_code(crate::hierarchy::METROPOLITAN_DEPARTMENT_CODE)
            .await
            .unwrap();
        assert!(matches!(response, ZoneResultsResponse::Communes(ref c) if c.len() == 2));

        let response = reporter.results_by_department_code("023").await.unwrap();
        let ZoneResultsResponse::Zone(results) = response else {
            panic!("expected single department response");
        };
        assert_eq!(results.zone.id, fx.dept_agboville);
        assert_eq!(results.statistics.votants, 360);
    }

    #[tokio::test]
    async fn published_tree_prunes_unpublished_branches() {
        let db = test_db().await;
        let fx = Fixture::seed(&db).await;

        let tree = reporter(&db).published_tree().await.unwrap();
        assert_eq!(tree.len(), 1, "region without published units is pruned");
        assert_eq!(tree[0].id, fx.region);

        let unit_ids: Vec<i64> = tree[0].children.iter().map(|c| c.id).collect();
        assert!(unit_ids.contains(&fx.cocody));
        assert!(unit_ids.contains(&fx.dept_agboville));
        assert!(!unit_ids.contains(&fx.yopougon));
        assert!(!unit_ids.contains(&fx.metro));

        let cocody = tree[0]
            .children
            .iter()
            .find(|c| c.id == fx.cocody)
            .unwrap();
        assert_eq!(cocody.children.len(), 1);
        assert_eq!(cocody.children[0].children.len(), 2);
    }

    #[tokio::test]
    async fn full_results_carry_processing_progress() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let full = reporter(&db).full_results().await.unwrap();
        assert_eq!(full.candidates.len(), 5);
        assert_eq!(full.processing.bureaux_traites, 4);
        assert_eq!(full.processing.bureaux_total, 5);
        assert_eq!(full.statistics.votants, 860);
        assert_eq!(full.results[0].rank, 1);
    }

    #[tokio::test]
    async fn candidates_detailed_rank_on_national_scores() {
        let db = test_db().await;
        let _fx = Fixture::seed(&db).await;

        let detailed = reporter(&db).candidates_detailed().await.unwrap();
        assert_eq!(detailed.len(), 5);
        assert_eq!(detailed[0].votes, 450);
        assert_eq!(detailed[0].rank, 1);
        assert!(detailed[0].is_winner);
        assert!(!detailed[0].is_tied);
        assert_eq!(detailed[4].votes, 15);
        assert_eq!(detailed[4].rank, 5);
    }
}
