//! The `CaseStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `casefile-store-sqlite`).
//! Higher layers (`casefile-report`, `casefile-cli`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  case::{CaseDetail, CaseId, CaseSummary, EntityId, NewCase, Person},
  entity::EntityKind,
  grid::{EditOutcome, RowEdit},
};

/// Abstraction over a Casefile store backend.
///
/// Every write method is one logical operation: it either applies all of its
/// statements or none of them.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CaseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// Create a case, creating the person for `input.username` first if no
  /// person with that username exists yet.
  fn create_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<CaseId, Self::Error>> + Send + '_;

  /// List all cases, or those whose name contains `filter`
  /// (case-insensitive). Order is unspecified.
  fn list_cases(
    &self,
    filter: Option<String>,
  ) -> impl Future<Output = Result<Vec<CaseSummary>, Self::Error>> + Send + '_;

  /// Resolve a case and every linked entity. Returns `None` if not found.
  fn get_case_detail(
    &self,
    case_id: CaseId,
  ) -> impl Future<Output = Result<Option<CaseDetail>, Self::Error>> + Send + '_;

  /// All known persons of interest.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Linked entities ───────────────────────────────────────────────────

  /// Create an entity of `kind` whose natural key is `value` and link it to
  /// the case.
  fn add_linked_entity(
    &self,
    case_id: CaseId,
    kind: EntityKind,
    value: String,
  ) -> impl Future<Output = Result<EntityId, Self::Error>> + Send + '_;

  /// Reconcile a saved grid row with the store.
  ///
  /// Only entities linked to `case_id` are ever written, and only the columns
  /// whose value actually changed. Rejections are reported in the returned
  /// [`EditOutcome`]; `Err` is reserved for storage failures.
  fn apply_row_edit(
    &self,
    case_id: CaseId,
    edit: RowEdit,
  ) -> impl Future<Output = Result<EditOutcome, Self::Error>> + Send + '_;

  /// Delete every entity of `kind` whose natural key equals `value`, together
  /// with its links to any case. Returns the number of entities removed.
  fn delete_entity(
    &self,
    kind: EntityKind,
    value: String,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
