//! Candidate ranking: ordered results with rank, winner and tie flags, and
//! the single-record selection rule that keeps re-imports from being
//! counted twice.

use chrono::DateTime;

use crate::database::{CandidateRow, ImportRecordRow};
use crate::model::ImportStatus;
use crate::reports::aggregation::{parse_count, round2};
use crate::reports::CandidateResult;

/// Convert summed per-ordinal scores into ordered candidate results.
///
/// Rank is stable: 1 + the number of candidates strictly ahead, so tied
/// candidates share a rank and the next candidate skips past them.
pub fn rank_candidates(
    candidates: &[CandidateRow],
    scores: &[u64; 5],
    total_exprimes: u64,
) -> Vec<CandidateResult> {
    let votes_of = |candidate: &CandidateRow| -> u64 {
        let ordinal = candidate.ordinal.clamp(1, 5) as usize;
        scores[ordinal - 1]
    };

    let max_votes = candidates.iter().map(votes_of).max().unwrap_or(0);
    let leaders = candidates
        .iter()
        .filter(|c| votes_of(c) == max_votes)
        .count();

    let mut results: Vec<CandidateResult> = candidates
        .iter()
        .map(|candidate| {
            let votes = votes_of(candidate);
            let ahead = candidates.iter().filter(|c| votes_of(c) > votes).count();
            let percentage = if total_exprimes == 0 {
                0.0
            } else {
                round2(votes as f64 / total_exprimes as f64 * 100.0)
            };
            CandidateResult {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                party: candidate.party.clone(),
                votes,
                percentage,
                rank: (ahead + 1) as u32,
                is_winner: votes == max_votes && votes > 0,
                is_tied: leaders > 1 && votes == max_votes,
            }
        })
        .collect();

    results.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.candidate_id.cmp(&b.candidate_id)));
    results
}

/// Pick the one record to score for a (cel, polling station) pair.
///
/// Preference order: the record whose total-voters figure matches the
/// station's canonical total, then the most recent fully-processed record,
/// then the most recently imported one.
pub fn select_record<'a>(
    records: &[&'a ImportRecordRow],
    canonical_votants: Option<i64>,
) -> Option<&'a ImportRecordRow> {
    if let Some(canonical) = canonical_votants {
        let matching = records
            .iter()
            .filter(|r| parse_count(&r.total_votants) as i64 == canonical)
            .max_by_key(|r| recency(r))
            .copied();
        if matching.is_some() {
            return matching;
        }
    }

    let processed = records
        .iter()
        .filter(|r| {
            r.statut
                .as_deref()
                .map(|s| ImportStatus::from_raw(s) == ImportStatus::Processed)
                .unwrap_or(false)
        })
        .max_by_key(|r| recency(r))
        .copied();
    if processed.is_some() {
        return processed;
    }

    records.iter().max_by_key(|r| recency(r)).copied()
}

/// Recency key: parsed import timestamp, then row id as a tiebreaker for
/// rows imported in the same second.
fn recency(record: &ImportRecordRow) -> (i64, i64) {
    let timestamp = record
        .imported_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp())
        .unwrap_or(0);
    (timestamp, record.id)
}
