//! Lab report extraction from positioned PDF text
//!
//! This crate provides:
//! - Positioned text fragments from PDF pages
//! - Classification of fragments into patient fields, lab rows and comments
//!   by fixed template coordinate bands
//! - Row reconstruction by vertical proximity, with comment stitching

pub mod associator;
pub mod classifier;
pub mod extractor;
pub mod record;
pub mod report;
pub mod template;

pub use associator::{associate, Association};
pub use classifier::{classify_fragment, Classification};
pub use extractor::{extract_fragments, extract_fragments_mem, Fragment, LayoutParams, PageFragments};
pub use record::{Continuation, LabRow, PageRecord, Parameter, PatientInfo, ReportResult};
pub use report::{build_report, extract_page};
pub use template::{Band, BandRole, MatchPolicy, TemplateConfig};

use std::path::Path;

/// Extract a report from a PDF file using the default template
pub fn process_report<P: AsRef<Path>>(path: P) -> Result<ReportResult, ReportError> {
    process_report_with_template(path, &TemplateConfig::default())
}

/// Extract a report from a PDF file using a custom template
pub fn process_report_with_template<P: AsRef<Path>>(
    path: P,
    template: &TemplateConfig,
) -> Result<ReportResult, ReportError> {
    let start = std::time::Instant::now();
    let pages = extract_fragments(path, &LayoutParams::default())?;
    let report = build_report(&pages, template);
    log::debug!(
        "{} pages, {} rows in {}ms",
        report.pages.len(),
        report.row_count(),
        start.elapsed().as_millis()
    );
    Ok(report)
}

/// Extract a report from a PDF in memory using the default template
pub fn process_report_mem(buffer: &[u8]) -> Result<ReportResult, ReportError> {
    process_report_mem_with_template(buffer, &TemplateConfig::default())
}

/// Extract a report from a PDF in memory using a custom template
pub fn process_report_mem_with_template(
    buffer: &[u8],
    template: &TemplateConfig,
) -> Result<ReportResult, ReportError> {
    let pages = extract_fragments_mem(buffer, &LayoutParams::default())?;
    Ok(build_report(&pages, template))
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

impl From<lopdf::Error> for ReportError {
    fn from(e: lopdf::Error) -> Self {
        ReportError::Parse(e.to_string())
    }
}
