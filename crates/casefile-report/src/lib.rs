//! PDF case reports.
//!
//! [`build_report`] turns a [`casefile_core::case::CaseDetail`] into a
//! [`Report`] document model; [`ReportRenderer`] lays that model out with
//! `genpdf` and writes it to disk atomically.

pub mod document;
pub mod error;
pub mod pdf;
pub mod settings;

pub use document::{Report, Section, build_report, default_file_name};
pub use error::{Error, Result};
pub use pdf::ReportRenderer;
pub use settings::ReportSettings;
