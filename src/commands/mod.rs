//! CLI command implementations: thin wrappers that open the store, drive
//! the engine, and print payloads as pretty JSON.

mod seed;

pub use seed::seed_demo;

use std::path::Path;

use colored::*;

use crate::cache::ResultCache;
use crate::database::{schema, ResultsDatabase};
use crate::model::ZoneSelector;
use crate::publication::PublicationWorkflow;
use crate::reports::ResultsReporter;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn open_database(path: &Path, create: bool) -> Result<ResultsDatabase, Box<dyn std::error::Error>> {
    let url = if create {
        format!("sqlite:{}?mode=rwc", path.display())
    } else {
        format!("sqlite:{}", path.display())
    };
    Ok(ResultsDatabase::new(&url).await?)
}

fn reporter(db: ResultsDatabase, election: &str, cache_ttl: u64) -> ResultsReporter {
    ResultsReporter::new(db, ResultCache::with_ttl_secs(cache_ttl), election)
}

pub async fn init_schema(database: &Path) -> CommandResult {
    let db = open_database(database, true).await?;
    schema::create_schema(db.pool()).await?;
    schema::verify_schema(db.pool()).await?;
    println!(
        "✅ Schema ready: {}",
        database.display().to_string().bright_green()
    );
    Ok(())
}

pub async fn summary(database: &Path, election: &str, cache_ttl: u64) -> CommandResult {
    let db = open_database(database, false).await?;
    let summary = reporter(db.clone(), election, cache_ttl).header_summary().await?;
    tracing::debug!(queries = db.queries_run(), "store round-trips");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub async fn results(database: &Path, election: &str, cache_ttl: u64) -> CommandResult {
    let db = open_database(database, false).await?;
    let full = reporter(db.clone(), election, cache_ttl).full_results().await?;
    tracing::debug!(queries = db.queries_run(), "store round-trips");
    println!("{}", serde_json::to_string_pretty(&full)?);
    Ok(())
}

pub async fn zone(
    database: &Path,
    election: &str,
    cache_ttl: u64,
    selector: ZoneSelector,
    department_code: Option<&str>,
) -> CommandResult {
    let db = open_database(database, false).await?;
    let reporter = reporter(db, election, cache_ttl);
    let response = match department_code {
        Some(code) => reporter.results_by_department_code(code).await?,
        None => reporter.results_by_zone(&selector).await?,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub async fn tree(database: &Path, election: &str, cache_ttl: u64) -> CommandResult {
    let db = open_database(database, false).await?;
    let tree = reporter(db, election, cache_ttl).published_tree().await?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

pub async fn candidates(database: &Path, election: &str, cache_ttl: u64) -> CommandResult {
    let db = open_database(database, false).await?;
    let detailed = reporter(db, election, cache_ttl)
        .candidates_detailed()
        .await?;
    println!("{}", serde_json::to_string_pretty(&detailed)?);
    Ok(())
}

pub async fn publish(
    database: &Path,
    commune: bool,
    zone_id: i64,
    actor: &str,
    note: Option<&str>,
) -> CommandResult {
    let db = open_database(database, false).await?;
    let workflow = PublicationWorkflow::new(db);
    let outcome = if commune {
        workflow.publish_commune(zone_id, actor, note).await?
    } else {
        workflow.publish_department(zone_id, actor, note).await?
    };
    println!(
        "✅ {} {}",
        outcome.zone.label.bright_green().bold(),
        outcome.message
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn cancel(
    database: &Path,
    commune: bool,
    zone_id: i64,
    actor: &str,
    note: Option<&str>,
) -> CommandResult {
    let db = open_database(database, false).await?;
    let workflow = PublicationWorkflow::new(db);
    let outcome = if commune {
        workflow.cancel_commune(zone_id, actor, note).await?
    } else {
        workflow.cancel_department(zone_id, actor, note).await?
    };
    println!(
        "🚫 {} {}",
        outcome.zone.label.bright_yellow().bold(),
        outcome.message
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn details(database: &Path, zone_id: i64) -> CommandResult {
    let db = open_database(database, false).await?;
    let workflow = PublicationWorkflow::new(db);
    let details = workflow.zone_details(zone_id).await?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}
