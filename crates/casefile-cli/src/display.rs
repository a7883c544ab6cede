//! Plain-text rendering of case data for the terminal.

use std::fmt::Write as _;

use casefile_core::{
  case::{CaseDetail, CaseSummary, Person},
  entity::EntityKind,
  grid::Grid,
};

/// Left-aligned columns separated by two spaces, with a rule under the
/// header. When `numbered`, each row is prefixed with its 1-based index.
pub fn table(headers: &[String], rows: &[Vec<String>], numbered: bool) -> String {
  let mut headers = headers.to_vec();
  let mut rows = rows.to_vec();
  if numbered {
    headers.insert(0, "#".to_owned());
    for (i, row) in rows.iter_mut().enumerate() {
      row.insert(0, (i + 1).to_string());
    }
  }

  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in &rows {
    for (width, cell) in widths.iter_mut().zip(row) {
      *width = (*width).max(cell.chars().count());
    }
  }

  let mut out = String::new();
  let mut line = |cells: &[String]| {
    let text = cells
      .iter()
      .zip(&widths)
      .map(|(cell, width)| format!("{cell:<width$}"))
      .collect::<Vec<_>>()
      .join("  ");
    let _ = writeln!(out, "{}", text.trim_end());
  };
  line(&headers);
  line(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>());
  for row in &rows {
    line(row);
  }
  out
}

pub fn case_summaries(cases: &[CaseSummary]) -> String {
  let headers = ["ID", "Case Name", "Subject", "Username"].map(String::from);
  let rows: Vec<Vec<String>> = cases
    .iter()
    .map(|c| {
      vec![
        c.case_id.to_string(),
        c.case_name.clone(),
        c.subject_name.clone(),
        c.username.clone(),
      ]
    })
    .collect();
  table(&headers, &rows, false)
}

pub fn persons(persons: &[Person]) -> String {
  let headers = ["ID", "Full Name", "Username"].map(String::from);
  let rows: Vec<Vec<String>> = persons
    .iter()
    .map(|p| vec![p.person_id.to_string(), p.full_name.clone(), p.username.clone()])
    .collect();
  table(&headers, &rows, false)
}

/// Header block followed by one table per non-empty kind.
pub fn case_detail(detail: &CaseDetail) -> String {
  let case = &detail.case;
  let mut out = String::new();
  let _ = writeln!(out, "Case {}: {}", case.case_id, case.case_name);
  let _ = writeln!(out, "  Subject:      {}", case.subject_name);
  let _ = writeln!(out, "  Username:     {}", case.username);
  let _ = writeln!(out, "  Description:  {}", case.description);
  let _ = writeln!(out, "  Created At:   {}", case.created_at);
  let _ = writeln!(out, "  Last Updated: {}", case.last_updated);

  for kind in EntityKind::all().filter(|k| detail.count(*k) > 0) {
    let _ = writeln!(out, "\n{}", kind.heading());
    out.push_str(&table(&kind.headers(), &detail.rows(kind), true));
  }
  out
}

/// The grid's current cells, with unsaved rows marked `*`.
pub fn grid(grid: &Grid) -> String {
  if grid.is_empty() {
    return format!("No {} entries.\n", grid.kind().label());
  }
  let rows: Vec<Vec<String>> = grid
    .rows()
    .iter()
    .map(|row| {
      let mut cells = row.cells().to_vec();
      if row.is_dirty()
        && let Some(first) = cells.first_mut()
      {
        first.push_str(" *");
      }
      cells
    })
    .collect();
  table(grid.headers(), &rows, true)
}
