//! CLI entry point.
//!
//! # Responsibility
//! - Resolve config, start logging and construct the persistence adapter.
//! - Own one `NotesStore` per process and thread it through commands.

mod shell;

use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use notekeep_core::config::{data_dir, SaveModeConfig};
use notekeep_core::db::open_db_with_timeout;
use notekeep_core::{
    init_logging, load_config, BackendKind, Config, FileAdapter, LogLevel, LogNotifier, Notice,
    Note, Notifier, NotesStore, PersistenceAdapter, SaveMode, SqliteKvAdapter,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Parser)]
#[command(name = "notekeep", version)]
#[command(about = "Keep short text notes with undo/redo")]
struct Cli {
    /// Config file (defaults to config.toml in the data directory).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Storage backend override.
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
    /// Directory (file backend) or database file (sqlite backend).
    #[arg(long, value_name = "PATH")]
    location: Option<PathBuf>,
    /// Collection key inside the backend.
    #[arg(long)]
    key: Option<String>,
    /// How saves combine with stored notes.
    #[arg(long, value_enum)]
    save_mode: Option<SaveModeArg>,
    /// Absolute directory for log files; logging is off when unset.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    File,
    Sqlite,
}

#[derive(Clone, Copy, ValueEnum)]
enum SaveModeArg {
    Merge,
    Replace,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a note and save.
    Add { title: String, content: String },
    /// List all notes.
    List,
    /// Show one note.
    Show { id: String },
    /// Replace a note's title and content and save.
    Update {
        id: String,
        title: String,
        content: String,
    },
    /// Delete a note and save.
    Delete { id: String },
    /// Interactive session with undo/redo (default).
    Shell,
}

/// Prints notices for the user and mirrors them to the log.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        LogNotifier.notify(notice);
        if notice.is_error() {
            eprintln!("{notice}");
        } else {
            println!("{notice}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command ran but reported a failure.
fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let config = resolve_config(&cli)?;

    if let Some(dir) = &config.logging.dir {
        init_logging(config.logging.effective_level(), dir)?;
    }

    let location = config
        .storage
        .resolved_location()
        .ok_or("could not determine a storage location; pass --location")?;
    let key = config.storage.collection_key.as_str();
    let save_mode = SaveMode::from(config.storage.save_mode);

    let conn;
    let adapter: Box<dyn PersistenceAdapter + '_> = match config.storage.backend {
        BackendKind::File => Box::new(
            FileAdapter::new(&location).with_lock_timeout(config.storage.io_timeout()),
        ),
        BackendKind::Sqlite => {
            if let Some(parent) = location.parent() {
                std::fs::create_dir_all(parent)?;
            }
            conn = open_db_with_timeout(&location, config.storage.io_timeout())?;
            Box::new(SqliteKvAdapter::new(&conn))
        }
    };

    let mut store = NotesStore::with_notifier(ConsoleNotifier);
    if store.load_from(adapter.as_ref(), key).is_err() {
        return Ok(false);
    }

    let mutated = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => return shell::run(&mut store, adapter.as_ref(), key, save_mode),
        Commands::List => {
            print_list(store.list());
            return Ok(true);
        }
        Commands::Show { id } => {
            return Ok(match store.get_by_id(&id) {
                Some(note) => {
                    println!("{note}");
                    true
                }
                None => {
                    eprintln!("note not found: {id}");
                    false
                }
            });
        }
        Commands::Add { title, content } => store.add(Note::new(title, content)).is_ok(),
        Commands::Update { id, title, content } => {
            store.update_by_id(&id, title, content).is_ok()
        }
        Commands::Delete { id } => store.delete_by_id(&id).is_ok(),
    };

    if !mutated {
        return Ok(false);
    }
    Ok(store.save_to(adapter.as_ref(), key, save_mode).is_ok())
}

fn resolve_config(cli: &Cli) -> Result<Config, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => match data_dir() {
            Some(dir) => load_config(&dir.join(CONFIG_FILE_NAME))?,
            None => Config::default(),
        },
    };

    if let Some(backend) = cli.backend {
        config.storage.backend = match backend {
            BackendArg::File => BackendKind::File,
            BackendArg::Sqlite => BackendKind::Sqlite,
        };
    }
    if let Some(location) = &cli.location {
        config.storage.location = Some(location.clone());
    }
    if let Some(key) = &cli.key {
        config.storage.collection_key = key.clone();
    }
    if let Some(mode) = cli.save_mode {
        config.storage.save_mode = match mode {
            SaveModeArg::Merge => SaveModeConfig::Merge,
            SaveModeArg::Replace => SaveModeConfig::Replace,
        };
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.parse::<LogLevel>()?);
    }

    config.validate()?;
    Ok(config)
}

pub(crate) fn print_list(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes.");
        return;
    }
    for note in notes {
        println!("{note}\n");
    }
}
