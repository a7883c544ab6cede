//! Reconciliation of saved grid rows against the identity and join tables.
//!
//! These helpers run inside a transaction opened by the caller; they never
//! open or commit one themselves.

use std::sync::atomic::{AtomicU64, Ordering};

use casefile_core::{
  case::{CaseId, EntityId},
  entity::EntityKind,
  grid::{EditOutcome, NoOpReason, RowEdit},
};
use rusqlite::{OptionalExtension as _, Transaction, params};

use crate::encode::{display_cells, nullable_cells};

/// Resolve, authorise and apply one saved row.
///
/// Every `UPDATE` issued is counted in `writes`.
pub fn apply_row_edit_in_tx(
  tx: &Transaction<'_>,
  case_id: CaseId,
  edit: &RowEdit,
  now: &str,
  writes: &AtomicU64,
) -> rusqlite::Result<EditOutcome> {
  let columns = match edit.columns() {
    Ok(columns) => columns,
    Err(reason) => return Ok(EditOutcome::NoOp(reason)),
  };

  let kind = edit.kind;
  let Some(entity_id) = linked_entity_id(tx, case_id, kind, &edit.key)? else {
    let exists = key_exists(tx, kind, &edit.key)?;
    return Ok(if exists {
      EditOutcome::NotAuthorized { key: edit.key.clone() }
    } else {
      EditOutcome::NoOp(NoOpReason::KeyNotFound { key: edit.key.clone() })
    });
  };

  let select = format!(
    "SELECT {} FROM {} WHERE id = ?1",
    columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", "),
    kind.table(),
  );
  let raw = tx.query_row(&select, params![entity_id], |row| {
    nullable_cells(row, columns.len())
  })?;
  let stored = display_cells(&columns, raw);

  let changes = edit.changes(&columns, &stored);
  if changes.is_empty() {
    return Ok(EditOutcome::NoOp(NoOpReason::Unchanged));
  }

  for change in &changes {
    tx.execute(
      &format!(
        "UPDATE {} SET {} = ?1 WHERE id = ?2",
        kind.table(),
        change.column.name
      ),
      params![change.value, entity_id],
    )?;
    writes.fetch_add(1, Ordering::Relaxed);
  }
  touch_case(tx, case_id, now, writes)?;

  Ok(EditOutcome::Updated {
    entity_id,
    columns: changes.iter().map(|c| c.column.name.to_owned()).collect(),
  })
}

/// The first entity of `kind` with natural key `key` that is linked to the
/// case. Entities with the same key linked only to other cases are skipped.
fn linked_entity_id(
  tx: &Transaction<'_>,
  case_id: CaseId,
  kind: EntityKind,
  key: &str,
) -> rusqlite::Result<Option<EntityId>> {
  let sql = format!(
    "SELECT e.id
     FROM {table} e
     JOIN {join} j ON j.{fk} = e.id
     WHERE e.{key_col} = ?1 AND j.case_id = ?2
     ORDER BY e.id
     LIMIT 1",
    table = kind.table(),
    join = kind.join_table(),
    fk = kind.join_column(),
    key_col = kind.key_column().name,
  );
  tx.query_row(&sql, params![key, case_id], |row| row.get(0))
    .optional()
}

fn key_exists(
  tx: &Transaction<'_>,
  kind: EntityKind,
  key: &str,
) -> rusqlite::Result<bool> {
  let sql = format!(
    "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
    kind.table(),
    kind.key_column().name
  );
  Ok(tx.query_row(&sql, params![key], |_| Ok(())).optional()?.is_some())
}

/// Bump `last_updated` on a case.
pub fn touch_case(
  tx: &Transaction<'_>,
  case_id: CaseId,
  now: &str,
  writes: &AtomicU64,
) -> rusqlite::Result<()> {
  tx.execute(
    "UPDATE cases SET last_updated = ?1 WHERE id = ?2",
    params![now, case_id],
  )?;
  writes.fetch_add(1, Ordering::Relaxed);
  Ok(())
}

/// Bump `last_updated` on every case linked to an entity of `kind` with
/// natural key `key`.
pub fn touch_cases_linked_to(
  tx: &Transaction<'_>,
  kind: EntityKind,
  key: &str,
  now: &str,
  writes: &AtomicU64,
) -> rusqlite::Result<()> {
  let sql = format!(
    "UPDATE cases SET last_updated = ?1
     WHERE id IN (
       SELECT j.case_id
       FROM {join} j
       JOIN {table} e ON j.{fk} = e.id
       WHERE e.{key_col} = ?2
     )",
    join = kind.join_table(),
    table = kind.table(),
    fk = kind.join_column(),
    key_col = kind.key_column().name,
  );
  tx.execute(&sql, params![now, key])?;
  writes.fetch_add(1, Ordering::Relaxed);
  Ok(())
}
