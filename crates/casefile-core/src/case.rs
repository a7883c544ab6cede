//! Cases, persons, and the resolved case-detail bundle.
//!
//! A case groups a subject with the evidence linked to it. The detail bundle
//! is a read model: every optional value is already coalesced into its
//! display form, so reports and grids render exactly what the store returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, entity::EntityKind};

/// Surrogate key of a case row.
pub type CaseId = i64;

/// Surrogate key of a linked-entity row (in its own identity table).
pub type EntityId = i64;

/// `strftime` pattern for every stored and displayed timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp the way it is stored and displayed.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.format(TIMESTAMP_FORMAT).to_string()
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CaseStore::create_case`].
#[derive(Debug, Clone)]
pub struct NewCase {
  pub case_name:    String,
  pub subject_name: String,
  /// Links the case to a person; the person is created if unseen.
  pub username:     String,
  pub description:  Option<String>,
}

impl NewCase {
  /// Case name, subject name and username are required.
  pub fn validate(&self) -> Result<()> {
    for (field, value) in [
      ("case name", &self.case_name),
      ("subject name", &self.subject_name),
      ("username", &self.username),
    ] {
      if value.trim().is_empty() {
        return Err(Error::MissingField(field));
      }
    }
    Ok(())
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// One line of a case listing or search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
  pub case_id:      CaseId,
  pub case_name:    String,
  pub subject_name: String,
  pub username:     String,
}

/// A person of interest, keyed by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id: i64,
  pub full_name: String,
  pub username:  String,
}

/// Scalar fields of a case, in display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseHeader {
  pub case_id:      CaseId,
  pub case_name:    String,
  pub subject_name: String,
  pub username:     String,
  pub description:  String,
  pub created_at:   String,
  pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRow {
  pub ip_address: String,
  pub location:   String,
  pub isp:        String,
  pub last_seen:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRow {
  pub domain:    String,
  pub last_seen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfileRow {
  pub profile_url: String,
  pub platform:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
  pub info:       String,
  pub source:     String,
  pub date_found: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
  pub note:       String,
  pub created_at: String,
}

/// The fully resolved case: header plus every linked-entity collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetail {
  pub case:            CaseHeader,
  pub ips:             Vec<IpRow>,
  pub domains:         Vec<DomainRow>,
  pub social_profiles: Vec<SocialProfileRow>,
  pub metadata:        Vec<MetadataRow>,
  pub notes:           Vec<NoteRow>,
}

impl CaseDetail {
  /// Rows of `kind` as display cells, in [`EntityKind::columns`] order.
  pub fn rows(&self, kind: EntityKind) -> Vec<Vec<String>> {
    match kind {
      EntityKind::IpAddress => self
        .ips
        .iter()
        .map(|r| {
          vec![
            r.ip_address.clone(),
            r.location.clone(),
            r.isp.clone(),
            r.last_seen.clone(),
          ]
        })
        .collect(),
      EntityKind::Domain => self
        .domains
        .iter()
        .map(|r| vec![r.domain.clone(), r.last_seen.clone()])
        .collect(),
      EntityKind::SocialProfile => self
        .social_profiles
        .iter()
        .map(|r| vec![r.profile_url.clone(), r.platform.clone()])
        .collect(),
      EntityKind::Metadata => self
        .metadata
        .iter()
        .map(|r| vec![r.info.clone(), r.source.clone(), r.date_found.clone()])
        .collect(),
      EntityKind::Note => self
        .notes
        .iter()
        .map(|r| vec![r.note.clone(), r.created_at.clone()])
        .collect(),
    }
  }

  /// Number of linked rows of `kind`.
  pub fn count(&self, kind: EntityKind) -> usize {
    match kind {
      EntityKind::IpAddress => self.ips.len(),
      EntityKind::Domain => self.domains.len(),
      EntityKind::SocialProfile => self.social_profiles.len(),
      EntityKind::Metadata => self.metadata.len(),
      EntityKind::Note => self.notes.len(),
    }
  }
}
