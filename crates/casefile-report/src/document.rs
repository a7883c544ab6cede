//! The report document model.
//!
//! Building a [`Report`] is pure: it borrows the case detail and decides what
//! goes on the page and in which order. Layout and file output live in
//! [`crate::pdf`].

use std::path::{Path, PathBuf};

use casefile_core::{case::CaseDetail, entity::EntityKind};

use crate::ReportSettings;

/// A laid-out-independent description of one case report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
  pub title:    String,
  /// Label/value pairs of the case header table.
  pub header:   Vec<(String, String)>,
  /// Non-empty sections, in [`EntityKind`] order.
  pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
  /// A header row plus one row per entity.
  Table {
    kind:    EntityKind,
    heading: String,
    headers: Vec<String>,
    rows:    Vec<Vec<String>>,
  },
  /// One styled paragraph per note.
  Notes { heading: String, paragraphs: Vec<String> },
}

impl Section {
  pub fn heading(&self) -> &str {
    match self {
      Self::Table { heading, .. } | Self::Notes { heading, .. } => heading,
    }
  }
}

/// Assemble the report for `detail`. Kinds with no linked rows are omitted.
pub fn build_report(detail: &CaseDetail, settings: &ReportSettings) -> Report {
  let case = &detail.case;
  let header = vec![
    ("Case ID:".to_owned(), case.case_id.to_string()),
    ("Person of Interest:".to_owned(), case.subject_name.clone()),
    ("Username:".to_owned(), case.username.clone()),
    ("Created At:".to_owned(), case.created_at.clone()),
    ("Last Updated:".to_owned(), case.last_updated.clone()),
  ];

  let sections = EntityKind::all()
    .filter(|kind| detail.count(*kind) > 0)
    .map(|kind| match kind {
      EntityKind::Note => Section::Notes {
        heading:    kind.heading().to_owned(),
        paragraphs: detail
          .notes
          .iter()
          .map(|n| format!("{} (Created: {})", n.note, n.created_at))
          .collect(),
      },
      _ => Section::Table {
        kind,
        heading: kind.heading().to_owned(),
        headers: kind.headers(),
        rows: detail.rows(kind),
      },
    })
    .collect();

  Report { title: settings.title.clone(), header, sections }
}

/// `<title>_<case>.pdf`, with spaces and path separators replaced by `_`.
pub fn default_file_name(title: &str, case_name: &str) -> String {
  let sanitise = |s: &str| s.replace([' ', '/', '\\'], "_");
  format!("{}_{}.pdf", sanitise(title), sanitise(case_name))
}

/// Append `.pdf` unless `path` already ends with it (case-insensitively).
pub fn with_pdf_extension(path: &Path) -> PathBuf {
  let is_pdf = path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
  if is_pdf {
    path.to_path_buf()
  } else {
    let mut os = path.as_os_str().to_owned();
    os.push(".pdf");
    PathBuf::from(os)
  }
}

#[cfg(test)]
mod tests {
  use casefile_core::case::{
    CaseHeader, DomainRow, IpRow, MetadataRow, NoteRow, SocialProfileRow,
  };

  use super::*;

  fn detail() -> CaseDetail {
    CaseDetail {
      case:            CaseHeader {
        case_id:      7,
        case_name:    "Op Nightfall".into(),
        subject_name: "Jane Roe".into(),
        username:     "jroe99".into(),
        description:  "N/A".into(),
        created_at:   "2025-03-01 09:00:00".into(),
        last_updated: "2025-03-05 10:30:00".into(),
      },
      ips:             vec![IpRow {
        ip_address: "203.0.113.5".into(),
        location:   "N/A".into(),
        isp:        "N/A".into(),
        last_seen:  "Unknown".into(),
      }],
      domains:         vec![DomainRow {
        domain:    "example.com".into(),
        last_seen: "Unknown".into(),
      }],
      social_profiles: vec![SocialProfileRow {
        profile_url: "https://social.example/@jroe".into(),
        platform:    "Mastodon".into(),
      }],
      metadata:        vec![MetadataRow {
        info:       "EXIF: Canon EOS".into(),
        source:     "N/A".into(),
        date_found: "2025-03-02 12:00:00".into(),
      }],
      notes:           vec![NoteRow {
        note:       "Subject reuses handles".into(),
        created_at: "2025-03-03 08:15:00".into(),
      }],
    }
  }

  fn headings(report: &Report) -> Vec<&str> {
    report.sections.iter().map(Section::heading).collect()
  }

  #[test]
  fn sections_follow_fixed_order() {
    let report = build_report(&detail(), &ReportSettings::default());
    assert_eq!(report.title, "OSINT Case Report");
    assert_eq!(headings(&report), vec![
      "IP ADDRESSES",
      "DOMAINS",
      "SOCIAL PROFILES",
      "METADATA",
      "CASE NOTES",
    ]);
  }

  #[test]
  fn empty_kinds_are_omitted() {
    let mut detail = detail();
    detail.notes.clear();
    detail.metadata.clear();

    let report = build_report(&detail, &ReportSettings::default());
    assert_eq!(headings(&report), vec![
      "IP ADDRESSES",
      "DOMAINS",
      "SOCIAL PROFILES"
    ]);
  }

  #[test]
  fn header_and_placeholders_are_reproduced() {
    let report = build_report(&detail(), &ReportSettings::default());
    assert_eq!(report.header[0], ("Case ID:".into(), "7".into()));
    assert_eq!(report.header[1].1, "Jane Roe");

    let Section::Table { headers, rows, .. } = &report.sections[0] else {
      panic!("expected a table");
    };
    assert_eq!(headers, &["IP Address", "Location", "ISP", "Last Seen"]);
    assert_eq!(rows[0], vec!["203.0.113.5", "N/A", "N/A", "Unknown"]);
  }

  #[test]
  fn notes_are_paragraphs() {
    let report = build_report(&detail(), &ReportSettings::default());
    let Some(Section::Notes { paragraphs, .. }) = report.sections.last() else {
      panic!("expected notes last");
    };
    assert_eq!(paragraphs, &[
      "Subject reuses handles (Created: 2025-03-03 08:15:00)"
    ]);
  }

  #[test]
  fn building_does_not_mutate_the_detail() {
    let detail = detail();
    let before = detail.clone();
    let _ = build_report(&detail, &ReportSettings::default());
    assert_eq!(detail, before);
  }

  #[test]
  fn default_file_name_is_sanitised() {
    assert_eq!(
      default_file_name("OSINT Case Report", "Op Night/fall"),
      "OSINT_Case_Report_Op_Night_fall.pdf"
    );
  }

  #[test]
  fn pdf_extension_is_appended_once() {
    assert_eq!(
      with_pdf_extension(Path::new("out/report")),
      PathBuf::from("out/report.pdf")
    );
    assert_eq!(
      with_pdf_extension(Path::new("out/report.PDF")),
      PathBuf::from("out/report.PDF")
    );
    assert_eq!(
      with_pdf_extension(Path::new("out/report.v2")),
      PathBuf::from("out/report.v2.pdf")
    );
  }
}
