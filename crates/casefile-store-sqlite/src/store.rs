//! [`SqliteStore`], the SQLite implementation of [`CaseStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use casefile_core::{
  case::{CaseDetail, CaseId, CaseSummary, EntityId, NewCase, Person},
  entity::EntityKind,
  grid::{EditOutcome, RowEdit},
  store::CaseStore,
};
use rusqlite::{OptionalExtension as _, params};

use crate::{
  Error, Result,
  encode::{
    RawCaseDetail, RawCaseHeader, RawCaseSummary, RawPerson, linked_rows_sql,
    name_matches, now, nullable_cells,
  },
  reconcile::{apply_row_edit_in_tx, touch_case, touch_cases_linked_to},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Casefile store backed by a single SQLite file.
///
/// Clones share the same connection and write counter.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  /// Number of `INSERT`/`UPDATE`/`DELETE` statements issued so far.
  writes: Arc<AtomicU64>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, writes: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, writes: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total write statements this store has issued.
  pub fn write_statements(&self) -> u64 { self.writes.load(Ordering::Relaxed) }
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  // ── Cases ─────────────────────────────────────────────────────────────────

  async fn create_case(&self, input: NewCase) -> Result<CaseId> {
    input.validate()?;

    let at     = now();
    let writes = Arc::clone(&self.writes);

    let (case_id, person_created) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
          .query_row(
            "SELECT id FROM persons WHERE username = ?1",
            params![input.username],
            |row| row.get(0),
          )
          .optional()?;

        if existing.is_none() {
          tx.execute(
            "INSERT INTO persons (full_name, username) VALUES (?1, ?2)",
            params![input.subject_name, input.username],
          )?;
          writes.fetch_add(1, Ordering::Relaxed);
        }

        tx.execute(
          "INSERT INTO cases (
             case_name, subject_name, username, description,
             created_at, last_updated
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![
            input.case_name,
            input.subject_name,
            input.username,
            input.description,
            at,
          ],
        )?;
        writes.fetch_add(1, Ordering::Relaxed);
        let case_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok((case_id, existing.is_none()))
      })
      .await?;

    tracing::info!(case_id, person_created, "created case");
    Ok(case_id)
  }

  async fn list_cases(&self, filter: Option<String>) -> Result<Vec<CaseSummary>> {
    let raws: Vec<RawCaseSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT id, case_name, subject_name, username FROM cases")?;
        let rows = stmt
          .query_map([], RawCaseSummary::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let cases: Vec<CaseSummary> = raws
      .into_iter()
      .filter(|raw| match (&filter, &raw.case_name) {
        (None, _) => true,
        (Some(f), Some(name)) => name_matches(name, f),
        (Some(_), None) => false,
      })
      .map(RawCaseSummary::into_summary)
      .collect();

    tracing::debug!(filter = ?filter, results = cases.len(), "listed cases");
    Ok(cases)
  }

  async fn get_case_detail(&self, case_id: CaseId) -> Result<Option<CaseDetail>> {
    let raw: Option<RawCaseDetail> = self
      .conn
      .call(move |conn| {
        let header = conn
          .query_row(
            "SELECT id, case_name, subject_name, username, description,
                    created_at, last_updated
             FROM cases WHERE id = ?1",
            params![case_id],
            RawCaseHeader::from_row,
          )
          .optional()?;

        let Some(header) = header else {
          return Ok(None);
        };

        let mut linked = Vec::new();
        for kind in EntityKind::all() {
          let width = kind.columns().len();
          let mut stmt = conn.prepare(&linked_rows_sql(kind))?;
          let rows = stmt
            .query_map(params![case_id], |row| nullable_cells(row, width))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          linked.push((kind, rows));
        }

        Ok(Some(RawCaseDetail { header, linked }))
      })
      .await?;

    if raw.is_none() {
      tracing::warn!(case_id, "no case found");
    }
    Ok(raw.map(RawCaseDetail::into_detail))
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, full_name, username FROM persons")?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawPerson::into_person).collect())
  }

  // ── Linked entities ───────────────────────────────────────────────────────

  async fn add_linked_entity(
    &self,
    case_id: CaseId,
    kind:    EntityKind,
    value:   String,
  ) -> Result<EntityId> {
    if value.trim().is_empty() {
      return Err(Error::EmptyValue(kind));
    }

    let at     = now();
    let writes = Arc::clone(&self.writes);

    let entity_id: Option<EntityId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let case_exists = tx
          .query_row("SELECT 1 FROM cases WHERE id = ?1", params![case_id], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if !case_exists {
          return Ok(None);
        }

        match kind {
          EntityKind::Note => tx.execute(
            "INSERT INTO notes (case_id, note, created_at) VALUES (?1, ?2, ?3)",
            params![case_id, value, at],
          )?,
          EntityKind::Metadata => tx.execute(
            "INSERT INTO metadata (info, date_found) VALUES (?1, ?2)",
            params![value, at],
          )?,
          _ => tx.execute(
            &format!(
              "INSERT INTO {} ({}) VALUES (?1)",
              kind.table(),
              kind.key_column().name
            ),
            params![value],
          )?,
        };
        writes.fetch_add(1, Ordering::Relaxed);
        let entity_id = tx.last_insert_rowid();

        tx.execute(
          &format!(
            "INSERT INTO {} (case_id, {}) VALUES (?1, ?2)",
            kind.join_table(),
            kind.join_column()
          ),
          params![case_id, entity_id],
        )?;
        writes.fetch_add(1, Ordering::Relaxed);

        touch_case(&tx, case_id, &at, &writes)?;
        tx.commit()?;
        Ok(Some(entity_id))
      })
      .await?;

    let entity_id = entity_id.ok_or(Error::CaseNotFound(case_id))?;
    tracing::info!(case_id, %kind, entity_id, "added linked entity");
    Ok(entity_id)
  }

  async fn apply_row_edit(
    &self,
    case_id: CaseId,
    edit:    RowEdit,
  ) -> Result<EditOutcome> {
    let at     = now();
    let writes = Arc::clone(&self.writes);
    let kind   = edit.kind;
    let key    = edit.key.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = apply_row_edit_in_tx(&tx, case_id, &edit, &at, &writes)?;
        // A transaction dropped without commit rolls back; only commit when
        // something was written.
        if outcome.is_updated() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    match &outcome {
      EditOutcome::Updated { columns, .. } => {
        tracing::info!(case_id, %kind, key = %key, ?columns, "updated linked entity");
      }
      EditOutcome::NotAuthorized { .. } => {
        tracing::warn!(case_id, %kind, key = %key, "entry not linked to case");
      }
      EditOutcome::NoOp(reason) => {
        tracing::debug!(case_id, %kind, key = %key, %reason, "row edit not applied");
      }
    }
    Ok(outcome)
  }

  async fn delete_entity(&self, kind: EntityKind, value: String) -> Result<usize> {
    let at     = now();
    let writes = Arc::clone(&self.writes);
    let key    = value.clone();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        touch_cases_linked_to(&tx, kind, &value, &at, &writes)?;
        let deleted = tx.execute(
          &format!(
            "DELETE FROM {} WHERE {} = ?1",
            kind.table(),
            kind.key_column().name
          ),
          params![value],
        )?;
        writes.fetch_add(1, Ordering::Relaxed);
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    tracing::info!(%kind, key = %key, deleted, "deleted entity");
    Ok(deleted)
  }
}
