//! Report settings, as read from the `[report]` configuration table.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Family used when the configured font is not found in any font directory.
/// It ships in [`bundled_font_dir`], which is searched last.
pub const FALLBACK_FONT: &str = "DejaVuSans";

/// Directories searched for TTF font families, in order.
pub const DEFAULT_FONT_DIRS: &[&str] = &[
  "./fonts",
  "/usr/share/fonts/liberation",
  "/usr/share/fonts/truetype/liberation",
  "/usr/share/fonts/truetype/dejavu",
  "/System/Library/Fonts",
  "/Library/Fonts",
  "/System/Library/Fonts/Supplemental",
];

/// The `fonts/` directory shipped with this crate, if it is still on disk.
pub fn bundled_font_dir() -> Option<PathBuf> {
  let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fonts");
  dir.is_dir().then_some(dir)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
  /// Printed at the top of every report and used in default file names.
  pub title:      String,
  /// `Helvetica`, `Times`, `Courier`, or the name of any TTF family found in
  /// `font_dirs`. Falls back to [`FALLBACK_FONT`] when not found.
  pub font:       String,
  pub output_dir: PathBuf,
  pub font_dirs:  Vec<PathBuf>,
}

impl Default for ReportSettings {
  fn default() -> Self {
    Self {
      title:      "OSINT Case Report".to_owned(),
      font:       "Helvetica".to_owned(),
      output_dir: PathBuf::from("reports"),
      font_dirs:  DEFAULT_FONT_DIRS.iter().map(PathBuf::from).collect(),
    }
  }
}
