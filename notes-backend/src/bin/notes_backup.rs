//! Offline backup tool for the notes store.
//!
//! Usage:
//!   notes_backup export [FILE]     write a backup (default: markdown-notes-backup-<millis>.json)
//!   notes_backup import FILE --yes replace all notes with FILE
//!   notes_backup list              print notes, most recently updated first
//!
//! Reads the same environment as the server (`NOTES_DATA_DIR`, `NOTES_DB_FILE`).
//! Stop the server first; it only reads the store at startup.

use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;

use notes_backend::config::Config;
use notes_backend::db::SqliteStateStore;
use notes_backend::models::NotesConfig;
use notes_backend::notes::backup;
use notes_backend::workspace::Workspace;

fn usage() -> ExitCode {
    eprintln!("Usage: notes_backup <export [FILE] | import FILE --yes | list>");
    ExitCode::from(2)
}

fn open_workspace(config: &Config) -> Result<Workspace, String> {
    let notes_config = NotesConfig::load(&config.notes_config_path());
    let store = SqliteStateStore::open(&config.db_path(), &notes_config.store_key)
        .map_err(|e| format!("Failed to open {}: {}", config.db_path().display(), e))?;
    Workspace::open(Box::new(store), notes_config).map_err(|e| format!("Failed to load notes: {}", e))
}

fn run(args: &[String]) -> Result<(), String> {
    let config = Config::from_env();
    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| format!("Failed to create {}: {}", config.data_dir.display(), e))?;

    match args.first().map(String::as_str) {
        Some("export") => {
            let ws = open_workspace(&config)?;
            let doc = ws.export().map_err(|e| e.to_string())?;
            let path = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&doc.file_name));
            backup::write_backup(&path, &doc.body)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!("Exported {} notes to {}", ws.current_list().len(), path.display());
            Ok(())
        }
        Some("import") => {
            let path = args.get(1).map(PathBuf::from).ok_or("import needs a FILE")?;
            let raw = backup::read_backup(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            let state = backup::parse_import(&raw).map_err(|e| e.to_string())?;

            if !args.iter().any(|a| a == "--yes") {
                return Err(format!(
                    "{} holds {} notes and would replace everything; re-run with --yes",
                    path.display(),
                    state.notes.len()
                ));
            }

            let mut ws = open_workspace(&config)?;
            let result = ws.replace_state(state);
            if let Some(err) = ws.persistence_error() {
                return Err(format!("Import applied but not saved: {}", err));
            }
            println!("Imported {} notes", result.imported_notes);
            Ok(())
        }
        Some("list") => {
            let ws = open_workspace(&config)?;
            for note in ws.current_list() {
                let updated = chrono::DateTime::from_timestamp_millis(note.updated_at)
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let star = if note.favorite { "*" } else { " " };
                println!("{} {}  {}  {}", star, updated, note.id, note.title);
            }
            Ok(())
        }
        _ => Err(String::new()),
    }
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) if msg.is_empty() => usage(),
        Err(msg) => {
            eprintln!("{}", msg);
            ExitCode::FAILURE
        }
    }
}
