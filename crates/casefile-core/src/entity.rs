//! Linked-entity kinds and their relational layout.
//!
//! Every kind of record that can be attached to a case (IP addresses,
//! domains, social profiles, metadata, notes) is a variant of [`EntityKind`].
//! Each variant carries its identity table, join table and column list as
//! data, so storage and rendering code never dispatch on table-name strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::Error;

// ─── Placeholders ────────────────────────────────────────────────────────────

/// Display form of a missing scalar value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Display form of a missing timestamp.
pub const UNKNOWN: &str = "Unknown";

// ─── Columns ─────────────────────────────────────────────────────────────────

/// Whether a column holds free text or a `YYYY-MM-DD HH:MM:SS` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
  Text,
  Timestamp,
}

/// One editable column of a linked-entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  /// Grid header label, e.g. `"Last Seen"`.
  pub label: &'static str,
  /// SQL column name; always `column_name(label)`.
  pub name:  &'static str,
  pub kind:  ColumnKind,
}

impl Column {
  const fn text(label: &'static str, name: &'static str) -> Self {
    Self { label, name, kind: ColumnKind::Text }
  }

  const fn timestamp(label: &'static str, name: &'static str) -> Self {
    Self { label, name, kind: ColumnKind::Timestamp }
  }

  /// What a `NULL` in this column is displayed as.
  pub fn placeholder(&self) -> &'static str {
    match self.kind {
      ColumnKind::Text => NOT_AVAILABLE,
      ColumnKind::Timestamp => UNKNOWN,
    }
  }

  /// Coalesce a stored value into its display form.
  pub fn display(&self, value: Option<String>) -> String {
    value.unwrap_or_else(|| self.placeholder().to_owned())
  }
}

/// Derive a SQL column name from a grid header label: lower-cased, with
/// whitespace runs joined by underscores (`"Profile URL"` → `profile_url`).
pub fn column_name(label: &str) -> String {
  label
    .split_whitespace()
    .map(str::to_lowercase)
    .collect::<Vec<_>>()
    .join("_")
}

const IP_COLUMNS: &[Column] = &[
  Column::text("IP Address", "ip_address"),
  Column::text("Location", "location"),
  Column::text("ISP", "isp"),
  Column::timestamp("Last Seen", "last_seen"),
];

const DOMAIN_COLUMNS: &[Column] = &[
  Column::text("Domain", "domain"),
  Column::timestamp("Last Seen", "last_seen"),
];

const SOCIAL_PROFILE_COLUMNS: &[Column] = &[
  Column::text("Profile URL", "profile_url"),
  Column::text("Platform", "platform"),
];

const METADATA_COLUMNS: &[Column] = &[
  Column::text("Info", "info"),
  Column::text("Source", "source"),
  Column::timestamp("Date Found", "date_found"),
];

const NOTE_COLUMNS: &[Column] = &[
  Column::text("Note", "note"),
  Column::timestamp("Created At", "created_at"),
];

// ─── EntityKind ──────────────────────────────────────────────────────────────

/// The closed set of record kinds that can be linked to a case.
///
/// Declaration order is the order sections appear in a report.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  IpAddress,
  Domain,
  SocialProfile,
  Metadata,
  Note,
}

impl EntityKind {
  /// All kinds in report order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// Identity table name.
  pub fn table(self) -> &'static str {
    match self {
      Self::IpAddress => "ips",
      Self::Domain => "domains",
      Self::SocialProfile => "social_profiles",
      Self::Metadata => "metadata",
      Self::Note => "notes",
    }
  }

  /// Join table linking cases to this kind.
  pub fn join_table(self) -> &'static str {
    match self {
      Self::IpAddress => "case_ips",
      Self::Domain => "case_domains",
      Self::SocialProfile => "case_social_profiles",
      Self::Metadata => "case_metadata",
      Self::Note => "case_notes",
    }
  }

  /// Foreign-key column in [`Self::join_table`] pointing at [`Self::table`].
  pub fn join_column(self) -> &'static str {
    match self {
      Self::IpAddress => "ip_id",
      Self::Domain => "domain_id",
      Self::SocialProfile => "social_profile_id",
      Self::Metadata => "metadata_id",
      Self::Note => "note_id",
    }
  }

  /// Editable columns, natural key first.
  pub fn columns(self) -> &'static [Column] {
    match self {
      Self::IpAddress => IP_COLUMNS,
      Self::Domain => DOMAIN_COLUMNS,
      Self::SocialProfile => SOCIAL_PROFILE_COLUMNS,
      Self::Metadata => METADATA_COLUMNS,
      Self::Note => NOTE_COLUMNS,
    }
  }

  /// The natural-key column used to address rows from the grid.
  pub fn key_column(self) -> &'static Column { &self.columns()[0] }

  /// Look up a column by its SQL name.
  pub fn column(self, name: &str) -> Option<&'static Column> {
    self.columns().iter().find(|c| c.name == name)
  }

  /// Header labels in grid order.
  pub fn headers(self) -> Vec<String> {
    self.columns().iter().map(|c| c.label.to_owned()).collect()
  }

  /// Section heading used in reports.
  pub fn heading(self) -> &'static str {
    match self {
      Self::IpAddress => "IP ADDRESSES",
      Self::Domain => "DOMAINS",
      Self::SocialProfile => "SOCIAL PROFILES",
      Self::Metadata => "METADATA",
      Self::Note => "CASE NOTES",
    }
  }

  /// Singular human-readable label.
  pub fn label(self) -> &'static str {
    match self {
      Self::IpAddress => "IP Address",
      Self::Domain => "Domain",
      Self::SocialProfile => "Social Profile",
      Self::Metadata => "Metadata",
      Self::Note => "Note",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for EntityKind {
  type Err = Error;

  /// Accepts short names, kebab/snake forms, table names and labels,
  /// case-insensitively: `ip`, `ip-address`, `IP Address`, `ips`, …
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalised = s.trim().to_lowercase().replace([' ', '-'], "_");
    let kind = match normalised.as_str() {
      "ip" | "ips" | "ip_address" | "ip_addresses" => Self::IpAddress,
      "domain" | "domains" => Self::Domain,
      "social" | "social_profile" | "social_profiles" | "profile" => {
        Self::SocialProfile
      }
      "metadata" | "meta" => Self::Metadata,
      "note" | "notes" => Self::Note,
      _ => return Err(Error::UnknownEntityKind(s.to_owned())),
    };
    Ok(kind)
  }
}
