//! Interactive line-oriented session over one store.
//!
//! Undo/redo history lives only in memory, so it is meaningful only
//! within a session like this one.

use crate::print_list;
use notekeep_core::{Note, Notifier, NotesStore, PersistenceAdapter, SaveMode};
use std::error::Error;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  add <title> | <content>        add a note
  list                           list notes
  show <id>                      show one note
  update <id> <title> | <content>
  delete <id>                    delete a note
  undo / redo                    step through add/delete history
  load                           merge stored notes into this session
  save                           write notes to storage
  help                           this text
  quit                           save and exit";

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Add { title: String, content: String },
    List,
    Show(String),
    Update {
        id: String,
        title: String,
        content: String,
    },
    Delete(String),
    Undo,
    Redo,
    Load,
    Save,
    Help,
    Quit,
}

pub(crate) fn run<N: Notifier>(
    store: &mut NotesStore<N>,
    adapter: &dyn PersistenceAdapter,
    key: &str,
    save_mode: SaveMode,
) -> Result<bool, Box<dyn Error>> {
    println!("notekeep shell; type `help` for commands");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        // Failures are already reported through the store's notifier.
        match command {
            ShellCommand::Add { title, content } => {
                let _ = store.add(Note::new(title, content));
            }
            ShellCommand::List => print_list(store.list()),
            ShellCommand::Show(id) => match store.get_by_id(&id) {
                Some(note) => println!("{note}"),
                None => eprintln!("note not found: {id}"),
            },
            ShellCommand::Update { id, title, content } => {
                let _ = store.update_by_id(&id, title, content);
            }
            ShellCommand::Delete(id) => {
                let _ = store.delete_by_id(&id);
            }
            ShellCommand::Undo => {
                let _ = store.undo();
            }
            ShellCommand::Redo => {
                let _ = store.redo();
            }
            ShellCommand::Load => {
                let _ = store.load_from(adapter, key);
            }
            ShellCommand::Save => {
                let _ = store.save_to(adapter, key, save_mode);
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
        }
    }

    Ok(store.save_to(adapter, key, save_mode).is_ok())
}

/// Parses one input line; blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "add" => {
            let (title, content) = split_title_content(rest)?;
            ShellCommand::Add { title, content }
        }
        "list" | "ls" => ShellCommand::List,
        "show" => ShellCommand::Show(require_id(rest)?),
        "update" => {
            let (id, fields) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: update <id> <title> | <content>")?;
            let (title, content) = split_title_content(fields.trim())?;
            ShellCommand::Update {
                id: id.to_string(),
                title,
                content,
            }
        }
        "delete" | "rm" => ShellCommand::Delete(require_id(rest)?),
        "undo" => ShellCommand::Undo,
        "redo" => ShellCommand::Redo,
        "load" => ShellCommand::Load,
        "save" => ShellCommand::Save,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(command))
}

fn split_title_content(input: &str) -> Result<(String, String), String> {
    let (title, content) = input
        .split_once('|')
        .ok_or("expected `<title> | <content>`")?;
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }
    Ok((title.to_string(), content.trim().to_string()))
}

fn require_id(input: &str) -> Result<String, String> {
    if input.is_empty() {
        return Err("missing note id".to_string());
    }
    Ok(input.to_string())
}
