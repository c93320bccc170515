use std::env;
use std::process::ExitCode;

use animedb::{AnimeDatabase, DatabaseConfig, LevelOfDetail};
use idparse::MediaKind;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "\
usage: nagare <command>

commands:
  resolve <id> [season] [episode]   resolve a media id against the anime
                                    database and print the merged entry
  refresh                           download/refresh every corpus and exit
";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprint!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let data_path = env::var("DATA_PATH").unwrap_or_else(|_| "./data".to_string());
    let config = DatabaseConfig::from_env(&data_path);

    match command {
        "resolve" => resolve(config, &args[1..]).await,
        "refresh" => refresh(config).await,
        other => {
            eprintln!("unknown command: {other}");
            eprint!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

async fn resolve(config: DatabaseConfig, args: &[String]) -> ExitCode {
    let Some(id) = args.first() else {
        eprintln!("resolve: missing <id>");
        return ExitCode::FAILURE;
    };
    let season = args.get(1).and_then(|s| s.parse().ok());
    let episode = args.get(2).and_then(|s| s.parse().ok());

    if config.detail == LevelOfDetail::None {
        eprintln!("anime database is disabled (ANIME_DB_LEVEL_OF_DETAIL=none)");
        return ExitCode::FAILURE;
    }

    let db = match AnimeDatabase::new(config) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open anime database: {e}");
            return ExitCode::FAILURE;
        }
    };
    let scheduler = std::sync::Arc::clone(&db).init().await;

    let Some(mut parsed) = idparse::parse(id, MediaKind::Unknown) else {
        eprintln!("unrecognized id: {id}");
        scheduler.shutdown();
        return ExitCode::FAILURE;
    };
    parsed.season = season.or(parsed.season);
    parsed.episode = episode.or(parsed.episode);

    let entry = db.get_entry(parsed.source, &parsed.value, parsed.season, parsed.episode);
    scheduler.shutdown();

    match entry {
        Some(mut entry) => {
            animedb::enrich_parsed_id(&mut parsed, &entry);
            // Trim the bulky mapping rows out of the debug output.
            entry.episode_mappings.clear();
            println!("{}", serde_json::json!({ "parsedId": parsed, "entry": entry }));
            ExitCode::SUCCESS
        }
        None => {
            println!("null");
            ExitCode::SUCCESS
        }
    }
}

async fn refresh(config: DatabaseConfig) -> ExitCode {
    if config.detail == LevelOfDetail::None {
        eprintln!("anime database is disabled (ANIME_DB_LEVEL_OF_DETAIL=none)");
        return ExitCode::FAILURE;
    }
    let db = match AnimeDatabase::new(config) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open anime database: {e}");
            return ExitCode::FAILURE;
        }
    };
    let scheduler = std::sync::Arc::clone(&db).init().await;
    scheduler.shutdown();
    tracing::info!("refresh complete");
    ExitCode::SUCCESS
}
