//! The interactive `casefile shell`.

use std::{
  io::{self, Write as _},
  path::PathBuf,
};

use anyhow::{Context as _, anyhow, bail};
use casefile_core::{case::CaseId, entity::EntityKind};
use tokio::io::{AsyncBufReadExt as _, BufReader};

use crate::{display, logging::LogHandle, session::Session, settings::SettingsHandle};

const HELP: &str = "\
commands:
  open ID                      load a case
  show                         print the open case
  grid KIND                    print the editable grid for KIND
  set KIND ROW COLUMN VALUE    edit one cell (unsaved)
  save KIND ROW                write an edited row
  discard KIND ROW             revert unsaved edits in a row
  delete KIND ROW              delete the entry from every case
  add KIND VALUE               link a new entry to the open case
  report [PATH]                write the PDF report
  search [TEXT]                list cases whose name contains TEXT
  config set KEY VALUE         change a setting (applies immediately)
  help                         this text
  quit                         leave the shell

KIND is one of ip, domain, social, metadata, note. ROW is 1-based.
Quote arguments containing spaces: set note 1 Note \"seen on forum\"";

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Split a command line on whitespace, honouring single and double quotes.
pub fn split_args(line: &str) -> anyhow::Result<Vec<String>> {
  let mut args = Vec::new();
  let mut current = String::new();
  let mut in_arg = false;
  let mut quote: Option<char> = None;

  for c in line.chars() {
    match quote {
      Some(q) if c == q => quote = None,
      Some(_) => current.push(c),
      None if c == '"' || c == '\'' => {
        quote = Some(c);
        in_arg = true;
      }
      None if c.is_whitespace() => {
        if in_arg {
          args.push(std::mem::take(&mut current));
          in_arg = false;
        }
      }
      None => {
        current.push(c);
        in_arg = true;
      }
    }
  }

  if let Some(q) = quote {
    bail!("unterminated {q} quote");
  }
  if in_arg {
    args.push(current);
  }
  Ok(args)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Open(CaseId),
  Show,
  Grid(EntityKind),
  Set { kind: EntityKind, row: usize, column: String, value: String },
  Save { kind: EntityKind, row: usize },
  Discard { kind: EntityKind, row: usize },
  Delete { kind: EntityKind, row: usize },
  Add { kind: EntityKind, value: String },
  Report(Option<PathBuf>),
  Search(Option<String>),
  ConfigSet { key: String, value: String },
  Help,
  Quit,
}

/// Parse split arguments into a command. Rows are converted to 0-based.
pub fn parse_command(args: &[String]) -> anyhow::Result<Command> {
  let words: Vec<&str> = args.iter().map(String::as_str).collect();

  Ok(match words.as_slice() {
    ["open", id] => Command::Open(
      id.parse().with_context(|| format!("invalid case id {id:?}"))?,
    ),
    ["show"] => Command::Show,
    ["grid", k] => Command::Grid(kind(k)?),
    ["set", k, r, column, value] => Command::Set {
      kind:   kind(k)?,
      row:    row(r)?,
      column: (*column).to_owned(),
      value:  (*value).to_owned(),
    },
    ["save", k, r] => Command::Save { kind: kind(k)?, row: row(r)? },
    ["discard", k, r] => Command::Discard { kind: kind(k)?, row: row(r)? },
    ["delete", k, r] => Command::Delete { kind: kind(k)?, row: row(r)? },
    ["add", k, rest @ ..] if !rest.is_empty() => Command::Add {
      kind:  kind(k)?,
      value: rest.join(" "),
    },
    ["report"] => Command::Report(None),
    ["report", path] => Command::Report(Some(PathBuf::from(*path))),
    ["search"] => Command::Search(None),
    ["search", rest @ ..] => Command::Search(Some(rest.join(" "))),
    ["config", "set", key, value] => Command::ConfigSet {
      key:   (*key).to_owned(),
      value: (*value).to_owned(),
    },
    ["help"] | ["?"] => Command::Help,
    ["quit"] | ["exit"] => Command::Quit,
    [] => bail!("empty command"),
    [name, ..] => bail!("unrecognised command {name:?}; try `help`"),
  })
}

fn kind(s: &str) -> anyhow::Result<EntityKind> { Ok(s.parse()?) }

fn row(s: &str) -> anyhow::Result<usize> {
  match s.parse::<usize>() {
    Ok(n) if n >= 1 => Ok(n - 1),
    _ => bail!("row must be a number starting at 1, got {s:?}"),
  }
}

// ─── Loop ────────────────────────────────────────────────────────────────────

/// Read commands from stdin until `quit` or end of input.
pub async fn run(
  session: &mut Session,
  settings: &mut SettingsHandle,
  log: &LogHandle,
) -> anyhow::Result<()> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  println!("casefile shell; type `help` for commands");

  loop {
    let prompt = match session.open_case() {
      Some(open) => format!("case {}> ", open.case_id()),
      None => "casefile> ".to_owned(),
    };
    print!("{prompt}");
    io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
      break;
    };
    if line.trim().is_empty() {
      continue;
    }

    let command = match split_args(&line).and_then(|args| parse_command(&args)) {
      Ok(command) => command,
      Err(e) => {
        println!("error: {e}");
        continue;
      }
    };
    if command == Command::Quit {
      break;
    }
    if let Err(e) = execute(command, session, settings, log).await {
      tracing::error!(error = %format!("{e:#}"), "shell command failed");
      println!("error: {e:#}");
    }
  }
  Ok(())
}

async fn execute(
  command: Command,
  session: &mut Session,
  settings: &mut SettingsHandle,
  log: &LogHandle,
) -> anyhow::Result<()> {
  match command {
    Command::Open(id) => {
      let open = session.open(id).await?;
      print!("{}", display::case_detail(&open.detail));
    }
    Command::Show => {
      let open = session
        .open_case()
        .ok_or_else(|| anyhow!("no case is open; use `open ID`"))?;
      print!("{}", display::case_detail(&open.detail));
    }
    Command::Grid(kind) => print!("{}", display::grid(session.grid(kind)?)),
    Command::Set { kind, row, column, value } => {
      session.set_cell(kind, row, &column, &value)?;
      print!("{}", display::grid(session.grid(kind)?));
    }
    Command::Save { kind, row } => {
      let outcome = session.save(kind, row).await?;
      println!("{outcome}");
    }
    Command::Discard { kind, row } => {
      session.discard(kind, row)?;
      print!("{}", display::grid(session.grid(kind)?));
    }
    Command::Delete { kind, row } => {
      let deleted = session.delete(kind, row).await?;
      println!("deleted {deleted} {kind} entr{}", if deleted == 1 { "y" } else { "ies" });
    }
    Command::Add { kind, value } => {
      session.add(kind, value).await?;
      print!("{}", display::grid(session.grid(kind)?));
    }
    Command::Report(path) => {
      let written = session.report(path.as_deref())?;
      println!("report saved to {}", written.display());
    }
    Command::Search(filter) => {
      let cases = session.search(filter).await?;
      print!("{}", display::case_summaries(&cases));
    }
    Command::ConfigSet { key, value } => {
      let current = settings.set(&key, &value)?.clone();
      log.apply(&current.log)?;
      session.apply_settings(&current).await?;
      println!("{key} = {value}");
    }
    Command::Help => println!("{HELP}"),
    Command::Quit => {}
  }
  Ok(())
}
