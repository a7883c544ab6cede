//! The editable grid model and the reconciliation plan derived from it.
//!
//! A [`Grid`] shows one kind of linked entity for the open case. Rows are
//! addressed by their natural key (the first column) as last fetched from the
//! store; surrogate ids never reach the grid. Saving a row turns it into a
//! [`RowEdit`], which the store resolves, authorises against the case, and
//! applies column by column. The outcome is always reported as an
//! [`EditOutcome`] value rather than an error.

use std::fmt;

use chrono::NaiveDateTime;

use crate::{
  Error, Result,
  case::{CaseDetail, EntityId, TIMESTAMP_FORMAT},
  entity::{Column, ColumnKind, EntityKind, NOT_AVAILABLE, UNKNOWN, column_name},
};

// ─── GridRow ─────────────────────────────────────────────────────────────────

/// One grid row: the values last fetched from the store plus any unsaved
/// edits on top of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
  original: Vec<String>,
  cells:    Vec<String>,
}

impl GridRow {
  pub fn new(values: Vec<String>) -> Self {
    Self { cells: values.clone(), original: values }
  }

  /// Current (possibly edited) cell values.
  pub fn cells(&self) -> &[String] { &self.cells }

  /// Values as last fetched from the store.
  pub fn original(&self) -> &[String] { &self.original }

  /// Overwrite one cell. Returns `false` if `column` is out of range.
  pub fn set(&mut self, column: usize, value: impl Into<String>) -> bool {
    match self.cells.get_mut(column) {
      Some(cell) => {
        *cell = value.into();
        true
      }
      None => false,
    }
  }

  /// Revert every unsaved edit to the last-fetched values. Purely in memory.
  pub fn discard(&mut self) { self.cells.clone_from(&self.original); }

  pub fn is_dirty(&self) -> bool { self.cells != self.original }

  /// The natural key the row was fetched under (its original first cell).
  pub fn key(&self) -> &str {
    self.original.first().map(String::as_str).unwrap_or_default()
  }
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// An editable table of one entity kind for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
  kind:    EntityKind,
  headers: Vec<String>,
  rows:    Vec<GridRow>,
}

impl Grid {
  /// Build a grid with the kind's standard headers.
  pub fn new(kind: EntityKind, rows: Vec<Vec<String>>) -> Self {
    Self {
      kind,
      headers: kind.headers(),
      rows: rows.into_iter().map(GridRow::new).collect(),
    }
  }

  pub fn from_detail(detail: &CaseDetail, kind: EntityKind) -> Self {
    Self::new(kind, detail.rows(kind))
  }

  pub fn kind(&self) -> EntityKind { self.kind }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn rows(&self) -> &[GridRow] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn row(&self, index: usize) -> Option<&GridRow> { self.rows.get(index) }

  pub fn row_mut(&mut self, index: usize) -> Option<&mut GridRow> {
    self.rows.get_mut(index)
  }

  /// Position of a column given its header label or SQL name,
  /// case-insensitively.
  pub fn column_index(&self, column: &str) -> Result<usize> {
    let wanted = column_name(column);
    self
      .headers
      .iter()
      .position(|h| column_name(h) == wanted)
      .ok_or_else(|| Error::UnknownColumn {
        kind:   self.kind,
        column: column.to_owned(),
      })
  }

  /// Snapshot row `index` as an edit ready to be saved.
  pub fn edit(&self, index: usize) -> Option<RowEdit> {
    self.rows.get(index).map(|row| RowEdit {
      kind:    self.kind,
      headers: self.headers.clone(),
      key:     row.key().to_owned(),
      cells:   row.cells().to_vec(),
    })
  }
}

// ─── RowEdit ─────────────────────────────────────────────────────────────────

/// A saved grid row on its way to the store.
///
/// Column names are derived from `headers` the same way for every kind, so
/// any header that is not one of the kind's columns rejects the whole edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEdit {
  pub kind:    EntityKind,
  pub headers: Vec<String>,
  /// Natural key the row was fetched under; used to find the entity even if
  /// the key cell itself was edited.
  pub key:     String,
  pub cells:   Vec<String>,
}

/// A single column write produced by [`RowEdit::changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange {
  pub column: &'static Column,
  /// `None` writes SQL `NULL`.
  pub value:  Option<String>,
}

impl RowEdit {
  /// Validate the edit and map its headers onto the kind's columns.
  pub fn columns(&self) -> Result<Vec<&'static Column>, NoOpReason> {
    if self.headers.len() != self.cells.len() {
      return Err(NoOpReason::RowShape {
        headers: self.headers.len(),
        cells:   self.cells.len(),
      });
    }

    let columns = self
      .headers
      .iter()
      .map(|h| {
        self
          .kind
          .column(&column_name(h))
          .ok_or_else(|| NoOpReason::UnknownColumn(h.clone()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    if is_missing(&self.key) {
      return Err(NoOpReason::MissingKey);
    }
    let key_column = self.kind.key_column();
    for (column, cell) in columns.iter().zip(&self.cells) {
      if column.name == key_column.name && is_missing(cell) {
        return Err(NoOpReason::MissingKey);
      }
      if column.kind == ColumnKind::Timestamp
        && let Some(value) = normalise(cell)
        && NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT).is_err()
      {
        return Err(NoOpReason::InvalidTimestamp {
          column: column.name.to_owned(),
          value,
        });
      }
    }

    Ok(columns)
  }

  /// Columns whose edited value differs from `stored` (display form, same
  /// order as `columns`). Blank cells and either placeholder mean `NULL` in
  /// every column; a cell equal to its stored text is never a change.
  pub fn changes(
    &self,
    columns: &[&'static Column],
    stored: &[String],
  ) -> Vec<ColumnChange> {
    columns
      .iter()
      .zip(&self.cells)
      .zip(stored)
      .filter_map(|((column, cell), stored)| {
        if cell == stored {
          return None;
        }
        let value = normalise(cell);
        let shown = value.as_deref().unwrap_or(column.placeholder());
        (shown != stored.as_str()).then_some(ColumnChange {
          column: *column,
          value,
        })
      })
      .collect()
  }
}

fn is_missing(value: &str) -> bool {
  let value = value.trim();
  value.is_empty() || value == NOT_AVAILABLE
}

fn normalise(cell: &str) -> Option<String> {
  let trimmed = cell.trim();
  if trimmed.is_empty() || trimmed == NOT_AVAILABLE || trimmed == UNKNOWN {
    None
  } else {
    Some(cell.to_owned())
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Why a saved row produced no write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
  /// The row has no usable natural key.
  MissingKey,
  /// No entity of this kind has the row's natural key.
  KeyNotFound { key: String },
  /// Every cell already matches the store.
  Unchanged,
  /// A header does not name a column of this kind.
  UnknownColumn(String),
  /// The row and header widths differ.
  RowShape { headers: usize, cells: usize },
  /// A timestamp cell is not `YYYY-MM-DD HH:MM:SS`.
  InvalidTimestamp { column: String, value: String },
}

/// Result of applying a [`RowEdit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
  Updated {
    entity_id: EntityId,
    /// SQL names of the columns written.
    columns:   Vec<String>,
  },
  NoOp(NoOpReason),
  /// Entities with this key exist, but none is linked to the case.
  NotAuthorized { key: String },
}

impl EditOutcome {
  pub fn is_updated(&self) -> bool { matches!(self, Self::Updated { .. }) }
}

impl fmt::Display for NoOpReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingKey => f.write_str("row has no identifying value"),
      Self::KeyNotFound { key } => write!(f, "no entry matches {key:?}"),
      Self::Unchanged => f.write_str("nothing changed"),
      Self::UnknownColumn(c) => write!(f, "unknown column {c:?}"),
      Self::RowShape { headers, cells } => {
        write!(f, "row has {cells} cells but {headers} headers")
      }
      Self::InvalidTimestamp { column, value } => {
        write!(f, "{column} must look like 2025-01-31 13:45:00, got {value:?}")
      }
    }
  }
}

impl fmt::Display for EditOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Updated { columns, .. } => write!(f, "updated {}", columns.join(", ")),
      Self::NoOp(reason) => write!(f, "no change: {reason}"),
      Self::NotAuthorized { key } => {
        write!(f, "{key:?} is not linked to this case")
      }
    }
  }
}
