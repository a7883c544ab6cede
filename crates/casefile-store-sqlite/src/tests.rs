//! Integration tests for `SqliteStore` against an in-memory database.

use casefile_core::{
  case::{CaseId, NewCase},
  entity::EntityKind,
  grid::{EditOutcome, Grid, NoOpReason},
  store::CaseStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_case(case_name: &str, username: &str) -> NewCase {
  NewCase {
    case_name:    case_name.into(),
    subject_name: "Jane Roe".into(),
    username:     username.into(),
    description:  Some("Phishing infrastructure".into()),
  }
}

async fn grid(s: &SqliteStore, case_id: CaseId, kind: EntityKind) -> Grid {
  let detail = s.get_case_detail(case_id).await.unwrap().unwrap();
  Grid::from_detail(&detail, kind)
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_case_and_get_detail() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.case.case_id, id);
  assert_eq!(detail.case.case_name, "Op Nightfall");
  assert_eq!(detail.case.subject_name, "Jane Roe");
  assert_eq!(detail.case.description, "Phishing infrastructure");
  assert_eq!(detail.case.created_at, detail.case.last_updated);
  assert!(detail.ips.is_empty());
  assert!(detail.notes.is_empty());
}

#[tokio::test]
async fn missing_description_displays_placeholder() {
  let s = store().await;
  let mut input = new_case("Op Nightfall", "jroe99");
  input.description = None;
  let id = s.create_case(input).await.unwrap();

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.case.description, "N/A");
}

#[tokio::test]
async fn get_case_detail_missing_returns_none() {
  let s = store().await;
  assert!(s.get_case_detail(42).await.unwrap().is_none());
}

#[tokio::test]
async fn create_case_rejects_missing_fields() {
  let s = store().await;
  let result = s.create_case(new_case("", "jroe99")).await;
  assert!(matches!(
    result,
    Err(Error::Core(casefile_core::Error::MissingField("case name")))
  ));
  assert_eq!(s.write_statements(), 0);
}

#[tokio::test]
async fn person_is_created_once_per_username() {
  let s = store().await;
  s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.create_case(new_case("Op Daybreak", "jroe99")).await.unwrap();
  s.create_case(new_case("Op Dusk", "asmith")).await.unwrap();

  let persons = s.list_persons().await.unwrap();
  assert_eq!(persons.len(), 2);
  let usernames: Vec<_> = persons.iter().map(|p| p.username.as_str()).collect();
  assert!(usernames.contains(&"jroe99"));
  assert!(usernames.contains(&"asmith"));
  assert!(persons.iter().all(|p| p.full_name == "Jane Roe"));
}

#[tokio::test]
async fn list_cases_filters_case_insensitively() {
  let s = store().await;
  s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.create_case(new_case("Op Daybreak", "jroe99")).await.unwrap();

  assert_eq!(s.list_cases(None).await.unwrap().len(), 2);

  let hits = s.list_cases(Some("NIGHT".into())).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].case_name, "Op Nightfall");
  assert_eq!(hits[0].username, "jroe99");

  assert!(s.list_cases(Some("dusk".into())).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_cases_folds_non_ascii_case() {
  let s = store().await;
  s.create_case(new_case("Öresund Leak", "jroe99")).await.unwrap();
  s.create_case(new_case("Ärger", "jroe99")).await.unwrap();

  let hits = s.list_cases(Some("öresund".into())).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].case_name, "Öresund Leak");

  let hits = s.list_cases(Some("ÄRGER".into())).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].case_name, "Ärger");
}

#[tokio::test]
async fn list_cases_treats_wildcards_literally() {
  let s = store().await;
  s.create_case(new_case("Op 100%", "jroe99")).await.unwrap();
  s.create_case(new_case("Op 1000", "jroe99")).await.unwrap();

  let hits = s.list_cases(Some("100%".into())).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].case_name, "Op 100%");
}

// ─── Linked entities ─────────────────────────────────────────────────────────

#[tokio::test]
async fn added_values_round_trip_unmodified() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();

  s.add_linked_entity(id, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();
  s.add_linked_entity(id, EntityKind::Domain, "Example.COM".into())
    .await
    .unwrap();
  s.add_linked_entity(
    id,
    EntityKind::SocialProfile,
    "https://social.example/@jroe".into(),
  )
  .await
  .unwrap();

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.ips[0].ip_address, "203.0.113.5");
  assert_eq!(detail.domains[0].domain, "Example.COM");
  assert_eq!(
    detail.social_profiles[0].profile_url,
    "https://social.example/@jroe"
  );
  assert_eq!(detail.social_profiles[0].platform, "N/A");
}

#[tokio::test]
async fn new_ip_shows_placeholders() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.ips.len(), 1);
  assert_eq!(detail.ips[0].location, "N/A");
  assert_eq!(detail.ips[0].isp, "N/A");
  assert_eq!(detail.ips[0].last_seen, "Unknown");
}

#[tokio::test]
async fn notes_and_metadata_are_stamped() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::Note, "Subject reuses handles".into())
    .await
    .unwrap();
  s.add_linked_entity(id, EntityKind::Metadata, "EXIF: Canon EOS".into())
    .await
    .unwrap();

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.notes[0].note, "Subject reuses handles");
  assert_ne!(detail.notes[0].created_at, "Unknown");
  assert_eq!(detail.metadata[0].source, "N/A");
  assert_ne!(detail.metadata[0].date_found, "Unknown");
}

#[tokio::test]
async fn linked_rows_keep_insertion_order() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  for ip in ["203.0.113.9", "203.0.113.1", "203.0.113.5"] {
    s.add_linked_entity(id, EntityKind::IpAddress, ip.into())
      .await
      .unwrap();
  }

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  let ips: Vec<_> = detail.ips.iter().map(|r| r.ip_address.as_str()).collect();
  assert_eq!(ips, vec!["203.0.113.9", "203.0.113.1", "203.0.113.5"]);
}

#[tokio::test]
async fn add_to_unknown_case_is_rejected() {
  let s = store().await;
  let result = s
    .add_linked_entity(99, EntityKind::Domain, "example.com".into())
    .await;
  assert!(matches!(result, Err(Error::CaseNotFound(99))));
  assert_eq!(s.write_statements(), 0);
}

#[tokio::test]
async fn add_blank_value_is_rejected() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  let result = s.add_linked_entity(id, EntityKind::Domain, "  ".into()).await;
  assert!(matches!(result, Err(Error::EmptyValue(EntityKind::Domain))));
}

// ─── Row edits ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_writes_only_changed_columns() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();

  let mut grid = grid(&s, id, EntityKind::IpAddress).await;
  let isp = grid.column_index("ISP").unwrap();
  grid.row_mut(0).unwrap().set(isp, "ExampleNet");

  let outcome = s.apply_row_edit(id, grid.edit(0).unwrap()).await.unwrap();
  let EditOutcome::Updated { columns, .. } = outcome else {
    panic!("expected an update, got {outcome:?}");
  };
  assert_eq!(columns, vec!["isp".to_string()]);

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.ips[0].isp, "ExampleNet");
  assert_eq!(detail.ips[0].location, "N/A");
}

#[tokio::test]
async fn unchanged_row_issues_no_writes() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();
  let before_detail = s.get_case_detail(id).await.unwrap().unwrap();

  let grid = grid(&s, id, EntityKind::IpAddress).await;
  let before = s.write_statements();
  let outcome = s.apply_row_edit(id, grid.edit(0).unwrap()).await.unwrap();

  assert_eq!(outcome, EditOutcome::NoOp(NoOpReason::Unchanged));
  assert_eq!(s.write_statements(), before);
  let after_detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(after_detail, before_detail);
}

#[tokio::test]
async fn edit_does_not_leak_into_other_cases() {
  let s = store().await;
  let a = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  let b = s.create_case(new_case("Op Daybreak", "asmith")).await.unwrap();
  s.add_linked_entity(a, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();
  s.add_linked_entity(b, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();

  let mut grid = grid(&s, b, EntityKind::IpAddress).await;
  grid.row_mut(0).unwrap().set(1, "Oslo");
  let outcome = s.apply_row_edit(b, grid.edit(0).unwrap()).await.unwrap();
  assert!(outcome.is_updated());

  let a_detail = s.get_case_detail(a).await.unwrap().unwrap();
  let b_detail = s.get_case_detail(b).await.unwrap().unwrap();
  assert_eq!(a_detail.ips[0].location, "N/A");
  assert_eq!(b_detail.ips[0].location, "Oslo");
}

#[tokio::test]
async fn edit_of_entry_linked_elsewhere_is_not_authorized() {
  let s = store().await;
  let a = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  let b = s.create_case(new_case("Op Daybreak", "asmith")).await.unwrap();
  s.add_linked_entity(a, EntityKind::Domain, "example.com".into())
    .await
    .unwrap();

  // A grid row for case b carrying a key that only case a links.
  let mut grid = Grid::new(EntityKind::Domain, vec![vec![
    "example.com".into(),
    "Unknown".into(),
  ]]);
  grid.row_mut(0).unwrap().set(1, "2025-03-05 10:30:00");
  let before = s.write_statements();

  let outcome = s.apply_row_edit(b, grid.edit(0).unwrap()).await.unwrap();
  assert_eq!(outcome, EditOutcome::NotAuthorized {
    key: "example.com".into(),
  });
  assert_eq!(s.write_statements(), before);

  let a_detail = s.get_case_detail(a).await.unwrap().unwrap();
  assert_eq!(a_detail.domains[0].last_seen, "Unknown");
}

#[tokio::test]
async fn edit_of_unknown_key_is_a_no_op() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  let mut grid = Grid::new(EntityKind::Domain, vec![vec![
    "ghost.example".into(),
    "Unknown".into(),
  ]]);
  grid.row_mut(0).unwrap().set(1, "2025-03-05 10:30:00");

  let outcome = s.apply_row_edit(id, grid.edit(0).unwrap()).await.unwrap();
  assert_eq!(
    outcome,
    EditOutcome::NoOp(NoOpReason::KeyNotFound { key: "ghost.example".into() })
  );
}

#[tokio::test]
async fn editing_the_key_cell_renames_the_entry() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::Domain, "exmaple.com".into())
    .await
    .unwrap();

  let mut grid = grid(&s, id, EntityKind::Domain).await;
  grid.row_mut(0).unwrap().set(0, "example.com");
  let outcome = s.apply_row_edit(id, grid.edit(0).unwrap()).await.unwrap();
  assert!(outcome.is_updated());

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.domains[0].domain, "example.com");
}

#[tokio::test]
async fn clearing_a_cell_stores_null() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::IpAddress, "203.0.113.5".into())
    .await
    .unwrap();

  let mut g = grid(&s, id, EntityKind::IpAddress).await;
  g.row_mut(0).unwrap().set(1, "Oslo");
  s.apply_row_edit(id, g.edit(0).unwrap()).await.unwrap();

  let mut g = grid(&s, id, EntityKind::IpAddress).await;
  g.row_mut(0).unwrap().set(1, "");
  let outcome = s.apply_row_edit(id, g.edit(0).unwrap()).await.unwrap();
  assert!(outcome.is_updated());

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.ips[0].location, "N/A");
}

#[tokio::test]
async fn not_available_clears_a_timestamp_column() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::Domain, "example.com".into())
    .await
    .unwrap();

  let mut g = grid(&s, id, EntityKind::Domain).await;
  g.row_mut(0).unwrap().set(1, "2025-03-05 10:30:00");
  s.apply_row_edit(id, g.edit(0).unwrap()).await.unwrap();

  let mut g = grid(&s, id, EntityKind::Domain).await;
  g.row_mut(0).unwrap().set(1, "N/A");
  let outcome = s.apply_row_edit(id, g.edit(0).unwrap()).await.unwrap();
  assert!(outcome.is_updated());

  let detail = s.get_case_detail(id).await.unwrap().unwrap();
  assert_eq!(detail.domains[0].last_seen, "Unknown");
}

#[tokio::test]
async fn invalid_timestamp_is_not_written() {
  let s = store().await;
  let id = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  s.add_linked_entity(id, EntityKind::Domain, "example.com".into())
    .await
    .unwrap();

  let mut grid = grid(&s, id, EntityKind::Domain).await;
  grid.row_mut(0).unwrap().set(1, "yesterday");
  let before = s.write_statements();
  let outcome = s.apply_row_edit(id, grid.edit(0).unwrap()).await.unwrap();

  assert!(matches!(
    outcome,
    EditOutcome::NoOp(NoOpReason::InvalidTimestamp { .. })
  ));
  assert_eq!(s.write_statements(), before);
}

// ─── Deletes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_entry_from_every_case() {
  let s = store().await;
  let a = s.create_case(new_case("Op Nightfall", "jroe99")).await.unwrap();
  let b = s.create_case(new_case("Op Daybreak", "asmith")).await.unwrap();
  s.add_linked_entity(a, EntityKind::Domain, "example.com".into())
    .await
    .unwrap();
  s.add_linked_entity(b, EntityKind::Domain, "example.com".into())
    .await
    .unwrap();
  s.add_linked_entity(b, EntityKind::Domain, "example.org".into())
    .await
    .unwrap();

  let deleted = s
    .delete_entity(EntityKind::Domain, "example.com".into())
    .await
    .unwrap();
  assert_eq!(deleted, 2);

  let a_detail = s.get_case_detail(a).await.unwrap().unwrap();
  let b_detail = s.get_case_detail(b).await.unwrap().unwrap();
  assert!(a_detail.domains.is_empty());
  assert_eq!(b_detail.domains.len(), 1);
  assert_eq!(b_detail.domains[0].domain, "example.org");
}

#[tokio::test]
async fn delete_of_unknown_value_removes_nothing() {
  let s = store().await;
  let deleted = s
    .delete_entity(EntityKind::IpAddress, "192.0.2.1".into())
    .await
    .unwrap();
  assert_eq!(deleted, 0);
}
