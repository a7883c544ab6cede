//! Interactive session state: the open case and its editable grids.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow, bail};
use casefile_core::{
  case::{CaseDetail, CaseId, CaseSummary, EntityId},
  entity::EntityKind,
  grid::{EditOutcome, Grid},
  store::CaseStore as _,
};
use casefile_report::ReportRenderer;
use casefile_store_sqlite::SqliteStore;

use crate::settings::Settings;

/// A case loaded into the session, with one grid per entity kind.
#[derive(Debug)]
pub struct OpenCase {
  pub detail: CaseDetail,
  grids:      Vec<Grid>,
}

impl OpenCase {
  fn new(detail: CaseDetail) -> Self {
    let grids = EntityKind::all()
      .map(|kind| Grid::from_detail(&detail, kind))
      .collect();
    Self { detail, grids }
  }

  pub fn case_id(&self) -> CaseId { self.detail.case.case_id }

  pub fn grid(&self, kind: EntityKind) -> &Grid {
    &self.grids[Self::slot(kind)]
  }

  fn grid_mut(&mut self, kind: EntityKind) -> &mut Grid {
    &mut self.grids[Self::slot(kind)]
  }

  fn slot(kind: EntityKind) -> usize {
    EntityKind::all().position(|k| k == kind).unwrap_or_default()
  }
}

/// Store, renderer and open case for the shell.
pub struct Session {
  store:      SqliteStore,
  store_path: PathBuf,
  renderer:   ReportRenderer,
  open:       Option<OpenCase>,
}

impl Session {
  pub fn new(store: SqliteStore, store_path: PathBuf, renderer: ReportRenderer) -> Self {
    Self { store, store_path, renderer, open: None }
  }

  pub fn store(&self) -> &SqliteStore { &self.store }

  pub fn open_case(&self) -> Option<&OpenCase> { self.open.as_ref() }

  fn require_open(&self) -> anyhow::Result<&OpenCase> {
    self.open.as_ref().ok_or_else(|| anyhow!("no case is open; use `open ID`"))
  }

  fn require_open_mut(&mut self) -> anyhow::Result<&mut OpenCase> {
    self.open.as_mut().ok_or_else(|| anyhow!("no case is open; use `open ID`"))
  }

  // ── Cases ─────────────────────────────────────────────────────────────────

  pub async fn open(&mut self, case_id: CaseId) -> anyhow::Result<&OpenCase> {
    let detail = self
      .store
      .get_case_detail(case_id)
      .await
      .context("failed to load case")?
      .ok_or_else(|| anyhow!("no case with id {case_id}"))?;
    tracing::info!(case_id, "opened case");
    Ok(self.open.insert(OpenCase::new(detail)))
  }

  /// Re-fetch the open case, replacing every grid.
  pub async fn refresh(&mut self) -> anyhow::Result<()> {
    let case_id = self.require_open()?.case_id();
    match self.store.get_case_detail(case_id).await? {
      Some(detail) => self.open = Some(OpenCase::new(detail)),
      None => {
        self.open = None;
        bail!("case {case_id} no longer exists");
      }
    }
    Ok(())
  }

  pub async fn search(&self, filter: Option<String>) -> anyhow::Result<Vec<CaseSummary>> {
    Ok(self.store.list_cases(filter).await?)
  }

  // ── Grid editing ──────────────────────────────────────────────────────────

  pub fn grid(&self, kind: EntityKind) -> anyhow::Result<&Grid> {
    Ok(self.require_open()?.grid(kind))
  }

  /// Edit one cell in memory. `row` is 0-based; `column` is a header label
  /// or column name.
  pub fn set_cell(
    &mut self,
    kind: EntityKind,
    row: usize,
    column: &str,
    value: &str,
  ) -> anyhow::Result<()> {
    let grid = self.require_open_mut()?.grid_mut(kind);
    let index = grid.column_index(column)?;
    let row_ref = grid
      .row_mut(row)
      .ok_or_else(|| anyhow!("no row {} in the {kind} grid", row + 1))?;
    row_ref.set(index, value);
    Ok(())
  }

  pub fn discard(&mut self, kind: EntityKind, row: usize) -> anyhow::Result<()> {
    let grid = self.require_open_mut()?.grid_mut(kind);
    grid
      .row_mut(row)
      .ok_or_else(|| anyhow!("no row {} in the {kind} grid", row + 1))?
      .discard();
    Ok(())
  }

  /// Save one grid row. The case is re-fetched after an update.
  pub async fn save(&mut self, kind: EntityKind, row: usize) -> anyhow::Result<EditOutcome> {
    let open = self.require_open()?;
    let case_id = open.case_id();
    let edit = open
      .grid(kind)
      .edit(row)
      .ok_or_else(|| anyhow!("no row {} in the {kind} grid", row + 1))?;

    let outcome = self.store.apply_row_edit(case_id, edit).await?;
    if outcome.is_updated() {
      self.refresh().await?;
    }
    Ok(outcome)
  }

  /// Delete the entity behind one grid row, from every case that links it.
  pub async fn delete(&mut self, kind: EntityKind, row: usize) -> anyhow::Result<usize> {
    let key = self
      .require_open()?
      .grid(kind)
      .row(row)
      .ok_or_else(|| anyhow!("no row {} in the {kind} grid", row + 1))?
      .key()
      .to_owned();

    let deleted = self.store.delete_entity(kind, key).await?;
    self.refresh().await?;
    Ok(deleted)
  }

  pub async fn add(&mut self, kind: EntityKind, value: String) -> anyhow::Result<EntityId> {
    let case_id = self.require_open()?.case_id();
    let entity_id = self.store.add_linked_entity(case_id, kind, value).await?;
    self.refresh().await?;
    Ok(entity_id)
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  /// Render the open case to `output`, or to the default report path.
  pub fn report(&self, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    let open = self.require_open()?;
    let path = match output {
      Some(path) => path.to_path_buf(),
      None => self.renderer.default_path(&open.detail.case.case_name),
    };
    self
      .renderer
      .render(&open.detail, &path)
      .with_context(|| format!("failed to write report to {}", path.display()))
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  /// Apply reloaded settings: swap the renderer and, if the database path
  /// changed, reopen the store and reload the open case from it. Log
  /// settings go through [`crate::logging::LogHandle::apply`].
  pub async fn apply_settings(&mut self, settings: &Settings) -> anyhow::Result<()> {
    self.renderer = ReportRenderer::new(settings.report.clone());

    if settings.store.path != self.store_path {
      let store = SqliteStore::open(&settings.store.path)
        .await
        .with_context(|| format!("failed to open store at {:?}", settings.store.path))?;
      self.store = store;
      self.store_path = settings.store.path.clone();
      tracing::info!(path = %self.store_path.display(), "store reopened");

      if let Some(case_id) = self.open.as_ref().map(OpenCase::case_id) {
        self.open = None;
        if self.open(case_id).await.is_err() {
          tracing::warn!(case_id, "open case not present in new store");
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use casefile_core::{case::NewCase, grid::NoOpReason, store::CaseStore};
  use casefile_report::ReportSettings;

  use super::*;

  async fn session() -> (Session, CaseId) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let case_id = store
      .create_case(NewCase {
        case_name:    "Op Nightfall".into(),
        subject_name: "Jane Roe".into(),
        username:     "jroe99".into(),
        description:  None,
      })
      .await
      .unwrap();
    let renderer = ReportRenderer::new(ReportSettings::default());
    (Session::new(store, PathBuf::from(":memory:"), renderer), case_id)
  }

  #[tokio::test]
  async fn commands_need_an_open_case() {
    let (mut s, _) = session().await;
    assert!(s.grid(EntityKind::Domain).is_err());
    assert!(s.add(EntityKind::Domain, "example.com".into()).await.is_err());
  }

  #[tokio::test]
  async fn open_unknown_case_fails() {
    let (mut s, _) = session().await;
    assert!(s.open(404).await.is_err());
    assert!(s.open_case().is_none());
  }

  #[tokio::test]
  async fn add_refreshes_the_grid() {
    let (mut s, id) = session().await;
    s.open(id).await.unwrap();
    s.add(EntityKind::IpAddress, "203.0.113.5".into()).await.unwrap();

    let grid = s.grid(EntityKind::IpAddress).unwrap();
    assert_eq!(grid.len(), 1);
    assert_eq!(grid.row(0).unwrap().cells()[0], "203.0.113.5");
  }

  #[tokio::test]
  async fn save_writes_and_refetches() {
    let (mut s, id) = session().await;
    s.open(id).await.unwrap();
    s.add(EntityKind::IpAddress, "203.0.113.5".into()).await.unwrap();

    s.set_cell(EntityKind::IpAddress, 0, "Location", "Oslo").unwrap();
    let outcome = s.save(EntityKind::IpAddress, 0).await.unwrap();
    assert!(outcome.is_updated());

    let open = s.open_case().unwrap();
    assert_eq!(open.detail.ips[0].location, "Oslo");
    assert!(!open.grid(EntityKind::IpAddress).row(0).unwrap().is_dirty());
  }

  #[tokio::test]
  async fn discard_reverts_without_touching_the_store() {
    let (mut s, id) = session().await;
    s.open(id).await.unwrap();
    s.add(EntityKind::Domain, "example.com".into()).await.unwrap();

    s.set_cell(EntityKind::Domain, 0, "Domain", "example.org").unwrap();
    let before = s.store().write_statements();
    s.discard(EntityKind::Domain, 0).unwrap();

    assert_eq!(s.store().write_statements(), before);
    let outcome = s.save(EntityKind::Domain, 0).await.unwrap();
    assert_eq!(outcome, EditOutcome::NoOp(NoOpReason::Unchanged));
  }

  #[tokio::test]
  async fn delete_removes_the_row() {
    let (mut s, id) = session().await;
    s.open(id).await.unwrap();
    s.add(EntityKind::Domain, "example.com".into()).await.unwrap();

    assert_eq!(s.delete(EntityKind::Domain, 0).await.unwrap(), 1);
    assert!(s.grid(EntityKind::Domain).unwrap().is_empty());
  }

  #[tokio::test]
  async fn bad_rows_and_columns_are_reported() {
    let (mut s, id) = session().await;
    s.open(id).await.unwrap();
    s.add(EntityKind::Domain, "example.com".into()).await.unwrap();

    assert!(s.set_cell(EntityKind::Domain, 5, "Domain", "x").is_err());
    assert!(s.set_cell(EntityKind::Domain, 0, "ASN", "x").is_err());
    assert!(s.save(EntityKind::Domain, 5).await.is_err());
  }
}
