//! `genpdf` layout and atomic file output.

use std::{
  fs,
  path::{Path, PathBuf},
};

use casefile_core::case::CaseDetail;
use genpdf::{
  Alignment, Document, Element as _, SimplePageDecorator,
  elements::{Break, FrameCellDecorator, Paragraph, TableLayout},
  fonts::{self, Builtin, FontData, FontFamily},
  style::{Color, Style},
};

use crate::{
  Error, Report, ReportSettings, Result, Section, build_report,
  default_file_name,
  document::with_pdf_extension,
  settings::{FALLBACK_FONT, bundled_font_dir},
};

/// Renders case reports with a fixed set of [`ReportSettings`].
#[derive(Debug, Clone)]
pub struct ReportRenderer {
  settings: ReportSettings,
}

impl ReportRenderer {
  pub fn new(settings: ReportSettings) -> Self { Self { settings } }

  pub fn settings(&self) -> &ReportSettings { &self.settings }

  pub fn build(&self, detail: &CaseDetail) -> Report {
    build_report(detail, &self.settings)
  }

  /// `<output_dir>/<title>_<case>.pdf`.
  pub fn default_path(&self, case_name: &str) -> PathBuf {
    self
      .settings
      .output_dir
      .join(default_file_name(&self.settings.title, case_name))
  }

  /// Render `detail` to `output` and return the path written.
  ///
  /// Missing parent directories are created. The PDF is rendered in memory,
  /// written to a sibling temporary file and renamed into place, so `output`
  /// either holds a complete report or is left untouched.
  pub fn render(&self, detail: &CaseDetail, output: &Path) -> Result<PathBuf> {
    let output = with_pdf_extension(output);
    if let Some(parent) = output.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }

    let report = self.build(detail);
    let bytes = self.layout(&report)?;
    write_atomically(&output, &bytes)?;

    tracing::info!(
      case_id = detail.case.case_id,
      path = %output.display(),
      sections = report.sections.len(),
      "report written"
    );
    Ok(output)
  }

  fn layout(&self, report: &Report) -> Result<Vec<u8>> {
    let mut doc = Document::new(self.font_family()?);
    doc.set_title(report.title.clone());
    doc.set_minimal_conformance();
    doc.set_line_spacing(1.25);

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(15);
    doc.set_page_decorator(decorator);

    doc.push(
      Paragraph::new(report.title.clone())
        .aligned(Alignment::Center)
        .styled(Style::new().bold().with_font_size(20)),
    );
    doc.push(Break::new(1.0));

    let mut header = TableLayout::new(vec![1, 2]);
    header.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    for (label, value) in &report.header {
      header
        .row()
        .element(
          Paragraph::new(label.clone())
            .styled(Style::new().bold())
            .padded(1),
        )
        .element(Paragraph::new(value.clone()).padded(1))
        .push()?;
    }
    doc.push(header);
    doc.push(Break::new(1.0));

    for section in &report.sections {
      doc.push(
        Paragraph::new(section.heading())
          .styled(Style::new().bold().with_font_size(14)),
      );
      doc.push(Break::new(0.3));

      match section {
        Section::Table { headers, rows, .. } => {
          doc.push(table(headers, rows)?);
        }
        Section::Notes { paragraphs, .. } => {
          for text in paragraphs {
            doc.push(
              Paragraph::new(text.clone())
                .styled(Style::new().italic().with_font_size(11)),
            );
            doc.push(Break::new(0.2));
          }
        }
      }
      doc.push(Break::new(1.0));
    }

    let mut bytes = Vec::new();
    doc.render(&mut bytes)?;
    Ok(bytes)
  }

  fn font_family(&self) -> Result<FontFamily<FontData>> {
    resolve_font(
      &self.settings.font,
      &self.settings.font_dirs,
      bundled_font_dir().as_deref(),
    )
  }
}

// ─── Fonts ───────────────────────────────────────────────────────────────────

/// The first directory holding the family for `font` wins. If none does,
/// [`FALLBACK_FONT`] is looked up in `dirs` and then in `bundled`.
fn resolve_font(
  font: &str,
  dirs: &[PathBuf],
  bundled: Option<&Path>,
) -> Result<FontFamily<FontData>> {
  let (family, builtin) = family_for(font);
  if let Some(found) = dirs.iter().find_map(|dir| load_family(dir, family, builtin)) {
    return Ok(found);
  }

  let fallback = dirs
    .iter()
    .map(PathBuf::as_path)
    .chain(bundled)
    .find_map(|dir| load_family(dir, FALLBACK_FONT, None));
  match fallback {
    Some(found) => {
      tracing::warn!(
        font,
        fallback = FALLBACK_FONT,
        "font family not found, using fallback"
      );
      Ok(found)
    }
    None => Err(Error::FontNotFound {
      family: family.to_owned(),
      dirs:   dirs.to_vec(),
    }),
  }
}

// Face suffixes in lookup order: `-Regular`/`-Italic` naming, then the bare
// and `-Oblique` naming DejaVu ships with.
const REGULAR: &[&str] = &["-Regular", ""];
const BOLD: &[&str] = &["-Bold"];
const ITALIC: &[&str] = &["-Italic", "-Oblique"];
const BOLD_ITALIC: &[&str] = &["-BoldItalic", "-BoldOblique"];

/// All four faces of `family` in `dir`. Builtin families are metric
/// stand-ins and use `genpdf`'s own file naming.
fn load_family(
  dir: &Path,
  family: &str,
  builtin: Option<Builtin>,
) -> Option<FontFamily<FontData>> {
  if !dir.is_dir() {
    return None;
  }
  if builtin.is_some() {
    return fonts::from_files(dir, family, builtin).ok();
  }
  Some(FontFamily {
    regular:     load_face(dir, family, REGULAR)?,
    bold:        load_face(dir, family, BOLD)?,
    italic:      load_face(dir, family, ITALIC)?,
    bold_italic: load_face(dir, family, BOLD_ITALIC)?,
  })
}

fn load_face(dir: &Path, family: &str, suffixes: &[&str]) -> Option<FontData> {
  let path = suffixes
    .iter()
    .map(|suffix| dir.join(format!("{family}{suffix}.ttf")))
    .find(|path| path.is_file())?;
  FontData::load(&path, None)
    .inspect_err(|e| {
      tracing::debug!(path = %path.display(), error = %e, "unreadable font file");
    })
    .ok()
}

/// TTF family and builtin PDF font for a configured font name. The standard
/// PDF fonts use Liberation metrics; anything else is embedded as-is.
fn family_for(font: &str) -> (&str, Option<Builtin>) {
  match font.to_ascii_lowercase().as_str() {
    "helvetica" => ("LiberationSans", Some(Builtin::Helvetica)),
    "times" => ("LiberationSerif", Some(Builtin::Times)),
    "courier" => ("LiberationMono", Some(Builtin::Courier)),
    _ => (font, None),
  }
}

fn table(headers: &[String], rows: &[Vec<String>]) -> Result<TableLayout> {
  let mut table = TableLayout::new(vec![1; headers.len()]);
  table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

  let mut row = table.row();
  for h in headers {
    row.push_element(
      Paragraph::new(h.clone())
        .styled(Style::new().bold().with_color(Color::Rgb(0, 0, 139)))
        .padded(1),
    );
  }
  row.push()?;

  for cells in rows {
    let mut row = table.row();
    for cell in cells {
      row.push_element(Paragraph::new(cell.clone()).padded(1));
    }
    row.push()?;
  }
  Ok(table)
}

fn write_atomically(output: &Path, bytes: &[u8]) -> Result<()> {
  let file_name = output
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let tmp = output.with_file_name(format!(".{file_name}.tmp"));

  if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, output))
  {
    let _ = fs::remove_file(&tmp);
    return Err(e.into());
  }
  Ok(())
}
