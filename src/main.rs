mod cache;
mod commands;
mod database;
mod hierarchy;
mod model;
mod publication;
mod reports;

use clap::{ArgEnum, Parser, Subcommand};
use std::path::PathBuf;

use crate::model::ZoneSelector;

#[derive(Parser)]
#[clap(
    name = "scrutin-report",
    about = "Aggregation and publication-gated reporting over election results"
)]
struct Opts {
    /// SQLite database holding the results store.
    #[clap(
        long,
        env = "RESULTS_DB",
        default_value = "results.db",
        global = true
    )]
    database: PathBuf,

    /// Result cache TTL in seconds, clamped to the 60-300 window.
    #[clap(
        long,
        env = "RESULTS_CACHE_TTL_SECS",
        default_value_t = cache::DEFAULT_TTL_SECS,
        global = true
    )]
    cache_ttl: u64,

    /// Election identifier scoping cache entries.
    #[clap(
        long,
        env = "RESULTS_ELECTION_ID",
        default_value = reports::DEFAULT_ELECTION_ID,
        global = true
    )]
    election: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ArgEnum)]
enum TargetKind {
    Department,
    Commune,
}

#[derive(Subcommand)]
enum Command {
    /// Create (or verify) the store schema.
    InitSchema,
    /// Seed a small demonstration dataset.
    SeedDemo,
    /// National header summary with published zone labels.
    Summary,
    /// Full national results payload: roster, totals, tree.
    Results,
    /// Results for one zone; pass exactly one selector.
    Zone {
        #[clap(long)]
        region: Option<i64>,
        #[clap(long)]
        department: Option<i64>,
        #[clap(long)]
        voting_place: Option<i64>,
        #[clap(long)]
        polling_station: Option<i64>,
        /// Deprecated: select a department by short code (can be ambiguous).
        #[clap(long, conflicts_with_all = &["region", "department", "voting_place", "polling_station"])]
        department_code: Option<String>,
    },
    /// Published zones tree (region → unit → voting place → station).
    Tree,
    /// Candidate roster with national scores.
    Candidates,
    /// Publish a department or commune.
    Publish {
        #[clap(arg_enum)]
        kind: TargetKind,
        zone_id: i64,
        #[clap(long, default_value = "cli")]
        actor: String,
        #[clap(long)]
        note: Option<String>,
    },
    /// Cancel a department or commune publication.
    Cancel {
        #[clap(arg_enum)]
        kind: TargetKind,
        zone_id: i64,
        #[clap(long, default_value = "cli")]
        actor: String,
        #[clap(long)]
        note: Option<String>,
    },
    /// Zone details: summary, electoral cells, publication history.
    Details { zone_id: i64 },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let database = opts.database.as_path();

    let outcome = match opts.command {
        Command::InitSchema => commands::init_schema(database).await,
        Command::SeedDemo => commands::seed_demo(database).await,
        Command::Summary => commands::summary(database, &opts.election, opts.cache_ttl).await,
        Command::Results => commands::results(database, &opts.election, opts.cache_ttl).await,
        Command::Zone {
            region,
            department,
            voting_place,
            polling_station,
            department_code,
        } => {
            let selector = ZoneSelector {
                region,
                department,
                voting_place,
                polling_station,
            };
            commands::zone(
                database,
                &opts.election,
                opts.cache_ttl,
                selector,
                department_code.as_deref(),
            )
            .await
        }
        Command::Tree => commands::tree(database, &opts.election, opts.cache_ttl).await,
        Command::Candidates => {
            commands::candidates(database, &opts.election, opts.cache_ttl).await
        }
        Command::Publish {
            kind,
            zone_id,
            actor,
            note,
        } => {
            commands::publish(
                database,
                matches!(kind, TargetKind::Commune),
                zone_id,
                &actor,
                note.as_deref(),
            )
            .await
        }
        Command::Cancel {
            kind,
            zone_id,
            actor,
            note,
        } => {
            commands::cancel(
                database,
                matches!(kind, TargetKind::Commune),
                zone_id,
                &actor,
                note.as_deref(),
            )
            .await
        }
        Command::Details { zone_id } => commands::details(database, zone_id).await,
    };

    if let Err(e) = outcome {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
