//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Every column that may be `NULL` is read as `Option<String>` and coalesced
//! into its display form here (`"N/A"` for text, `"Unknown"` for timestamps).
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC strings.

use casefile_core::{
  case::{
    CaseDetail, CaseHeader, CaseId, CaseSummary, DomainRow, IpRow,
    MetadataRow, NoteRow, Person, SocialProfileRow, format_timestamp,
  },
  entity::{Column, EntityKind, NOT_AVAILABLE, UNKNOWN},
};
use chrono::Utc;

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn now() -> String { format_timestamp(Utc::now()) }

// ─── Search ──────────────────────────────────────────────────────────────────

/// Whether `filter` occurs in `name`, ignoring case. Both sides are folded
/// with Unicode lowercasing; SQLite's `LIKE` only folds ASCII.
pub fn name_matches(name: &str, filter: &str) -> bool {
  name.to_lowercase().contains(&filter.to_lowercase())
}

// ─── SQL fragments ───────────────────────────────────────────────────────────

/// `SELECT` of every column of `kind` linked to the case bound as `?1`, in
/// link order.
pub fn linked_rows_sql(kind: EntityKind) -> String {
  let columns = kind
    .columns()
    .iter()
    .map(|c| format!("e.{}", c.name))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "SELECT {columns}
     FROM {join} j
     JOIN {table} e ON j.{fk} = e.id
     WHERE j.case_id = ?1
     ORDER BY j.id",
    join = kind.join_table(),
    table = kind.table(),
    fk = kind.join_column(),
  )
}

/// Read `n` nullable text columns from a row.
pub fn nullable_cells(
  row: &rusqlite::Row<'_>,
  n: usize,
) -> rusqlite::Result<Vec<Option<String>>> {
  (0..n).map(|i| row.get(i)).collect()
}

/// Coalesce stored values into display form, column by column.
pub fn display_cells(columns: &[&Column], raw: Vec<Option<String>>) -> Vec<String> {
  columns
    .iter()
    .zip(raw)
    .map(|(column, value)| column.display(value))
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `cases` row.
pub struct RawCaseHeader {
  pub case_id:      CaseId,
  pub case_name:    Option<String>,
  pub subject_name: Option<String>,
  pub username:     Option<String>,
  pub description:  Option<String>,
  pub created_at:   Option<String>,
  pub last_updated: Option<String>,
}

fn or_na(value: Option<String>) -> String {
  value.unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}

fn or_unknown(value: Option<String>) -> String {
  value.unwrap_or_else(|| UNKNOWN.to_owned())
}

impl RawCaseHeader {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:      row.get(0)?,
      case_name:    row.get(1)?,
      subject_name: row.get(2)?,
      username:     row.get(3)?,
      description:  row.get(4)?,
      created_at:   row.get(5)?,
      last_updated: row.get(6)?,
    })
  }

  pub fn into_header(self) -> CaseHeader {
    CaseHeader {
      case_id:      self.case_id,
      case_name:    or_na(self.case_name),
      subject_name: or_na(self.subject_name),
      username:     or_na(self.username),
      description:  or_na(self.description),
      created_at:   or_unknown(self.created_at),
      last_updated: or_unknown(self.last_updated),
    }
  }
}

/// Raw values read from a `cases` row for a listing.
pub struct RawCaseSummary {
  pub case_id:      CaseId,
  pub case_name:    Option<String>,
  pub subject_name: Option<String>,
  pub username:     Option<String>,
}

impl RawCaseSummary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:      row.get(0)?,
      case_name:    row.get(1)?,
      subject_name: row.get(2)?,
      username:     row.get(3)?,
    })
  }

  pub fn into_summary(self) -> CaseSummary {
    CaseSummary {
      case_id:      self.case_id,
      case_name:    or_na(self.case_name),
      subject_name: or_na(self.subject_name),
      username:     or_na(self.username),
    }
  }
}

/// Raw values read from a `persons` row.
pub struct RawPerson {
  pub person_id: i64,
  pub full_name: Option<String>,
  pub username:  String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id: row.get(0)?,
      full_name: row.get(1)?,
      username:  row.get(2)?,
    })
  }

  pub fn into_person(self) -> Person {
    Person {
      person_id: self.person_id,
      full_name: or_na(self.full_name),
      username:  self.username,
    }
  }
}

/// A case header plus the raw linked rows of every kind.
pub struct RawCaseDetail {
  pub header: RawCaseHeader,
  /// One entry per kind, each row in [`EntityKind::columns`] order.
  pub linked: Vec<(EntityKind, Vec<Vec<Option<String>>>)>,
}

impl RawCaseDetail {
  pub fn into_detail(self) -> CaseDetail {
    let mut detail = CaseDetail {
      case:            self.header.into_header(),
      ips:             Vec::new(),
      domains:         Vec::new(),
      social_profiles: Vec::new(),
      metadata:        Vec::new(),
      notes:           Vec::new(),
    };

    for (kind, rows) in self.linked {
      let columns: Vec<&Column> = kind.columns().iter().collect();
      for raw in rows {
        let mut cells = display_cells(&columns, raw).into_iter();
        let mut next = || cells.next().unwrap_or_default();
        match kind {
          EntityKind::IpAddress => detail.ips.push(IpRow {
            ip_address: next(),
            location:   next(),
            isp:        next(),
            last_seen:  next(),
          }),
          EntityKind::Domain => detail.domains.push(DomainRow {
            domain:    next(),
            last_seen: next(),
          }),
          EntityKind::SocialProfile => {
            detail.social_profiles.push(SocialProfileRow {
              profile_url: next(),
              platform:    next(),
            })
          }
          EntityKind::Metadata => detail.metadata.push(MetadataRow {
            info:       next(),
            source:     next(),
            date_found: next(),
          }),
          EntityKind::Note => detail.notes.push(NoteRow {
            note:       next(),
            created_at: next(),
          }),
        }
      }
    }

    detail
  }
}
