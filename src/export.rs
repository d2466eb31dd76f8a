//! Writes a finished run to disk.
//!
//! The workbook, the CSV and the JSON file are all produced from the same
//! record slice, so they agree on content and order.

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use log::{info, warn};

use crate::error::ExportError;
use crate::models::{JobRecord, RunResult, FIELD_NAMES};

pub const SHEET_NAME: &str = "Remote Jobs";
const DEFAULT_COLUMN_WIDTH: f64 = 15.0;
/// Longest string a worksheet cell accepts.
const MAX_CELL_CHARS: usize = 32_767;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const HEADER_FILL: u32 = 0x1F4E78;
const BAND_FILL: u32 = 0xF2F2F2;
const BORDER_COLOR: u32 = 0xD3D3D3;
const HEADER_HEIGHT: f64 = 25.0;

const COLUMN_WIDTHS: [(&str, f64); 17] = [
    ("Job Title", 35.0),
    ("Company Name", 25.0),
    ("Company Headquarters", 20.0),
    ("Date Posted", 15.0),
    ("Apply Deadline", 15.0),
    ("Job Type", 12.0),
    ("Job Category", 20.0),
    ("Region", 25.0),
    ("Salary", 20.0),
    ("Tags", 30.0),
    ("Company Description", 50.0),
    ("Job Description", 60.0),
    ("Job URL", 40.0),
    ("Application URL", 40.0),
    ("Company Profile URL", 35.0),
    ("Company Logo URL", 35.0),
    ("Company Total Jobs Posted", 15.0),
];

pub fn column_width(field: &str) -> f64 {
    COLUMN_WIDTHS
        .iter()
        .find(|(name, _)| *name == field)
        .map_or(DEFAULT_COLUMN_WIDTH, |(_, width)| *width)
}

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub xlsx: PathBuf,
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Names and writes the three export files for one run.
pub struct Exporter {
    output_dir: PathBuf,
    stem: String,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, started: DateTime<Local>) -> Self {
        Exporter {
            output_dir: output_dir.into(),
            stem: format!("WeWorkRemotely_Jobs_{}", started.format("%Y%m%d_%H%M%S")),
        }
    }

    pub fn paths(&self) -> ExportPaths {
        ExportPaths {
            xlsx: self.output_dir.join(format!("{}.xlsx", self.stem)),
            csv: self.output_dir.join(format!("{}.csv", self.stem)),
            json: self.output_dir.join(format!("{}.json", self.stem)),
        }
    }

    pub fn export_all(&self, run: &RunResult) -> Result<ExportPaths, ExportError> {
        fs::create_dir_all(&self.output_dir)?;
        let paths = self.paths();

        write_xlsx(&run.records, &paths.xlsx)?;
        info!("Excel saved: {}", paths.xlsx.display());

        let mut csv_out = BufWriter::new(File::create(&paths.csv)?);
        write_csv(&run.records, &mut csv_out)?;
        csv_out.flush()?;
        info!("CSV saved: {}", paths.csv.display());

        let mut json_out = BufWriter::new(File::create(&paths.json)?);
        write_json(&run.records, &mut json_out)?;
        json_out.flush()?;
        info!("JSON saved: {}", paths.json.display());

        Ok(paths)
    }
}

/// Clips `value` to what a worksheet cell accepts, warning when it had to.
fn cell_text<'a>(value: &'a str, title: &str, field: &str) -> &'a str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => {
            warn!(
                "'{}' for \"{}\" is {} characters long; truncated to {} in the workbook",
                field,
                title,
                value.chars().count(),
                MAX_CELL_CHARS
            );
            &value[..idx]
        }
        None => value,
    }
}

/// Sheet rows 3, 5, 7... (data rows at odd offsets) are shaded.
fn row_is_banded(idx: usize) -> bool {
    idx % 2 == 1
}

/// Header row plus every data row, across all columns.
fn autofilter_range(record_count: usize) -> (u32, u16, u32, u16) {
    (0, 0, record_count as u32, (FIELD_NAMES.len() - 1) as u16)
}

fn header_format() -> Format {
    Format::new()
        .set_font_name("Calibri")
        .set_font_size(11)
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(BORDER_COLOR))
}

fn data_format(banded: bool) -> Format {
    let format = Format::new()
        .set_font_name("Calibri")
        .set_font_size(10)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(BORDER_COLOR));
    if banded {
        format.set_background_color(Color::RGB(BAND_FILL))
    } else {
        format
    }
}

/// Styled workbook: dark header, bordered cells, banded rows, frozen header and an autofilter.
pub fn write_xlsx(records: &[JobRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = header_format();
    let plain_format = data_format(false);
    let banded_format = data_format(true);

    for (col, field) in FIELD_NAMES.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *field, &header_format)?;
        worksheet.set_column_width(col, column_width(field))?;
    }
    worksheet.set_row_height(0, HEADER_HEIGHT)?;

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        let format = if row_is_banded(idx) { &banded_format } else { &plain_format };
        for (col, value) in record.values().iter().enumerate() {
            let text = cell_text(value, &record.job_title, FIELD_NAMES[col]);
            worksheet.write_string_with_format(row, col as u16, text, format)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    let (first_row, first_col, last_row, last_col) = autofilter_range(records.len());
    worksheet.autofilter(first_row, first_col, last_row, last_col)?;

    workbook.save(path)?;
    Ok(())
}

/// Comma separated, BOM first so spreadsheet tools pick UTF-8.
pub fn write_csv<W: Write>(records: &[JobRecord], mut writer: W) -> Result<(), ExportError> {
    writer.write_all(UTF8_BOM)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(FIELD_NAMES)?;
    for record in records {
        csv_writer.write_record(record.values())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Pretty-printed array of objects, keys in column order.
pub fn write_json<W: Write>(records: &[JobRecord], writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// Counts for the end-of-run report.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_discovered: usize,
    pub total_finalized: usize,
    pub success_rate: Option<f64>,
    pub job_types: Vec<(String, usize)>,
    pub top_categories: Vec<(String, usize)>,
    pub top_regions: Vec<(String, usize)>,
}

impl Summary {
    pub fn from_run(run: &RunResult) -> Self {
        let records = &run.records;
        Summary {
            total_discovered: run.total_discovered,
            total_finalized: run.total_finalized(),
            success_rate: run.success_rate(),
            job_types: value_counts(records.iter().map(|r| r.job_type.as_str())),
            top_categories: top(value_counts(records.iter().map(|r| r.job_category.as_str())), 5),
            top_regions: top(value_counts(records.iter().map(|r| r.region.as_str())), 5),
        }
    }
}

/// Occurrences per value, most frequent first; ties keep first-seen order.
fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter().position(|(v, _)| v == value) {
            Some(idx) => counts[idx].1 += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn top(mut counts: Vec<(String, usize)>, n: usize) -> Vec<(String, usize)> {
    counts.truncate(n);
    counts
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SCRAPING SUMMARY")?;
        writeln!(f, "Total jobs found: {}", self.total_discovered)?;
        writeln!(f, "Successfully scraped: {}", self.total_finalized)?;
        match self.success_rate {
            Some(rate) => writeln!(f, "Success rate: {:.1}%", rate)?,
            None => writeln!(f, "Success rate: n/a (no listings found)")?,
        }
        let sections = [
            ("Job Types", &self.job_types),
            ("Top 5 Categories", &self.top_categories),
            ("Top 5 Regions", &self.top_regions),
        ];
        for (title, counts) in sections {
            writeln!(f, "{}:", title)?;
            for (value, count) in counts {
                writeln!(f, "  - {}: {}", value, count)?;
            }
        }
        Ok(())
    }
}
