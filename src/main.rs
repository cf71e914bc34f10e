//! Command-line entry point.
//!
//! Runs one analysis against a local CSV/JSON file, standing in for the
//! web layer: parse, analyze, print the JSON summary, persist results.
//!
//! Usage: pattern-analyzer-core <file> [--user <id>] [--db <path>]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use pattern_analyzer_core::storage::Database;
use pattern_analyzer_core::{parse_upload, Analyzer, AnalyzerConfig, SecondaryOutcome};

struct Args {
    file: PathBuf,
    user: String,
    db_path: PathBuf,
}

fn parse_args() -> Option<Args> {
    let mut file = None;
    let mut user = "local-user".to_string();
    let mut db_path = pattern_analyzer_core::config::default_db_path();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user = args.next()?,
            "--db" => db_path = PathBuf::from(args.next()?),
            _ => file = Some(PathBuf::from(arg)),
        }
    }

    Some(Args {
        file: file?,
        user,
        db_path,
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = parse_args() else {
        eprintln!("Usage: pattern-analyzer-core <file> [--user <id>] [--db <path>]");
        return ExitCode::FAILURE;
    };

    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "uploaded".to_string());

    let bytes = match std::fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Failed to read {}: {}", args.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let table = match parse_upload(&bytes, &file_name) {
        Ok(table) => table,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let db = match Database::open(&args.db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to open database {}: {}", args.db_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let analyzer = Analyzer::new(AnalyzerConfig::default(), db);
    let outcome = match analyzer.analyze(&table, &args.user, &file_name) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Analysis rejected: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let SecondaryOutcome::Failed { stage, message } = &outcome.secondary {
        log::warn!("Secondary path failed at {:?}: {}", stage, message);
    }

    let report = serde_json::json!({
        "summary": outcome.summary,
        "file_id": outcome.file_id,
        "rows": outcome.table.to_records(),
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Failed to serialize report: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
