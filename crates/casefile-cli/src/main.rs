//! `casefile`: command-line front end for the Casefile investigation store.
//!
//! # Usage
//!
//! ```
//! casefile case new --name "Op Nightfall" --subject "Jane Roe" --username jroe99
//! casefile entity add 1 ip 203.0.113.5
//! casefile entity edit 1 ip 203.0.113.5 --set "ISP=ExampleNet"
//! casefile report 1
//! casefile shell
//! ```

mod display;
mod logging;
mod session;
mod settings;
mod shell;

use std::path::PathBuf;

use anyhow::{Context as _, anyhow, bail};
use casefile_core::{
  case::{CaseId, NewCase},
  entity::EntityKind,
  grid::Grid,
  store::CaseStore as _,
};
use casefile_report::ReportRenderer;
use casefile_store_sqlite::SqliteStore;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use logging::LogQuery;
use session::Session;
use settings::{Settings, SettingsHandle};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "OSINT case management")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "casefile.toml", env = "CASEFILE_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create, list and inspect cases.
  #[command(subcommand)]
  Case(CaseCommand),

  /// Persons of interest.
  #[command(subcommand)]
  Person(PersonCommand),

  /// Add, edit and delete entries linked to cases.
  #[command(subcommand)]
  Entity(EntityCommand),

  /// Write the PDF report for a case.
  Report {
    case_id: CaseId,
    /// Output file; defaults to `<output_dir>/<title>_<case>.pdf`.
    #[arg(short, long)]
    output:  Option<PathBuf>,
  },

  /// Show the activity log.
  Logs {
    /// First day to show (YYYY-MM-DD); defaults to a week ago.
    #[arg(long)]
    from:  Option<NaiveDate>,
    /// Last day to show (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    to:    Option<NaiveDate>,
    /// ALL, DEBUG, INFO, WARNING or ERROR.
    #[arg(long, default_value = "ALL")]
    level: String,
  },

  /// Show or change settings.
  #[command(subcommand)]
  Config(ConfigCommand),

  /// Interactive session with editable grids.
  Shell,
}

#[derive(Subcommand, Debug)]
enum CaseCommand {
  New {
    #[arg(long)]
    name:        String,
    #[arg(long)]
    subject:     String,
    #[arg(long)]
    username:    String,
    #[arg(long)]
    description: Option<String>,
  },
  List {
    /// Only cases whose name contains this text (case-insensitive).
    #[arg(long)]
    filter: Option<String>,
  },
  Show {
    case_id: CaseId,
    #[arg(long)]
    json:    bool,
  },
}

#[derive(Subcommand, Debug)]
enum PersonCommand {
  List,
}

#[derive(Subcommand, Debug)]
enum EntityCommand {
  Add {
    case_id: CaseId,
    kind:    EntityKind,
    value:   String,
  },
  /// Edit the entry whose first column is KEY, as the grid would.
  Edit {
    case_id: CaseId,
    kind:    EntityKind,
    key:     String,
    /// `Column=value`; repeatable. Column is a header label or column name.
    #[arg(long = "set", value_name = "COLUMN=VALUE", required = true)]
    sets:    Vec<String>,
  },
  /// Delete every entry of KIND whose first column is VALUE, from all cases.
  Delete { kind: EntityKind, value: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
  Show,
  Set { key: String, value: String },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let mut settings = SettingsHandle::load(&cli.config)?;
  let log = logging::init(&settings.current().log)?;

  match cli.command {
    Command::Case(cmd) => run_case(cmd, settings.current()).await,
    Command::Person(PersonCommand::List) => {
      let store = open_store(settings.current()).await?;
      print!("{}", display::persons(&store.list_persons().await?));
      Ok(())
    }
    Command::Entity(cmd) => run_entity(cmd, settings.current()).await,
    Command::Report { case_id, output } => {
      let current = settings.current();
      let store = open_store(current).await?;
      let detail = store
        .get_case_detail(case_id)
        .await?
        .ok_or_else(|| anyhow!("no case with id {case_id}"))?;
      let renderer = ReportRenderer::new(current.report.clone());
      let path =
        output.unwrap_or_else(|| renderer.default_path(&detail.case.case_name));
      let written = renderer
        .render(&detail, &path)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
      println!("report saved to {}", written.display());
      Ok(())
    }
    Command::Logs { from, to, level } => {
      let today = Local::now().date_naive();
      let mut query = LogQuery::recent(today).with_level(&level);
      if let Some(from) = from {
        query.from = from;
      }
      if let Some(to) = to {
        query.to = to;
      }
      match logging::read_logs(&settings.current().log.path, &query)? {
        None => println!("No logs found."),
        Some(lines) => {
          for line in lines {
            println!("{line}");
          }
        }
      }
      Ok(())
    }
    Command::Config(ConfigCommand::Show) => {
      print!("{}", toml::to_string_pretty(settings.current())?);
      Ok(())
    }
    Command::Config(ConfigCommand::Set { key, value }) => {
      let current = settings.set(&key, &value)?;
      log.apply(&current.log)?;
      println!("{key} = {value} (saved to {})", settings.path().display());
      Ok(())
    }
    Command::Shell => {
      let current = settings.current().clone();
      let store = open_store(&current).await?;
      let mut session = Session::new(
        store,
        current.store.path.clone(),
        ReportRenderer::new(current.report.clone()),
      );
      shell::run(&mut session, &mut settings, &log).await
    }
  }
}

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&settings.store.path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store.path))
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn run_case(cmd: CaseCommand, settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  match cmd {
    CaseCommand::New { name, subject, username, description } => {
      let case_id = store
        .create_case(NewCase {
          case_name: name,
          subject_name: subject,
          username,
          description,
        })
        .await?;
      println!("created case {case_id}");
    }
    CaseCommand::List { filter } => {
      print!("{}", display::case_summaries(&store.list_cases(filter).await?));
    }
    CaseCommand::Show { case_id, json } => {
      let detail = store
        .get_case_detail(case_id)
        .await?
        .ok_or_else(|| anyhow!("no case with id {case_id}"))?;
      if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
      } else {
        print!("{}", display::case_detail(&detail));
      }
    }
  }
  Ok(())
}

async fn run_entity(cmd: EntityCommand, settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  match cmd {
    EntityCommand::Add { case_id, kind, value } => {
      let entity_id = store.add_linked_entity(case_id, kind, value).await?;
      println!("added {kind} {entity_id} to case {case_id}");
    }
    EntityCommand::Edit { case_id, kind, key, sets } => {
      let detail = store
        .get_case_detail(case_id)
        .await?
        .ok_or_else(|| anyhow!("no case with id {case_id}"))?;
      let mut grid = Grid::from_detail(&detail, kind);
      let index = grid
        .rows()
        .iter()
        .position(|row| row.key() == key)
        .ok_or_else(|| anyhow!("case {case_id} has no {kind} {key:?}"))?;

      for assignment in &sets {
        let Some((column, value)) = assignment.split_once('=') else {
          bail!("expected COLUMN=VALUE, got {assignment:?}");
        };
        let column = grid.column_index(column.trim())?;
        if let Some(row) = grid.row_mut(index) {
          row.set(column, value);
        }
      }

      let edit = grid
        .edit(index)
        .ok_or_else(|| anyhow!("case {case_id} has no {kind} {key:?}"))?;
      let outcome = store.apply_row_edit(case_id, edit).await?;
      println!("{outcome}");
    }
    EntityCommand::Delete { kind, value } => {
      let deleted = store.delete_entity(kind, value).await?;
      println!("deleted {deleted} {kind} entr{}", if deleted == 1 { "y" } else { "ies" });
    }
  }
  Ok(())
}
