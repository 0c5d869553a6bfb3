//! Page and report assembly

use crate::associator::Association;
use crate::classifier::{classify_fragment, Classification};
use crate::extractor::Fragment;
use crate::record::{PageRecord, ReportResult};
use crate::template::TemplateConfig;

/// Build the record for one page from its fragments, in enumeration order
pub fn extract_page(fragments: &[Fragment], template: &TemplateConfig) -> PageRecord {
    let mut record = PageRecord::default();

    for fragment in fragments {
        match classify_fragment(fragment, fragments, template) {
            Classification::Patient(info) => record.patient.absorb(info),
            Classification::Body(Association::Row(row)) => record.push_row(row),
            Classification::Body(Association::Comment(text)) => record.push_comment(text),
            Classification::Ignored => {}
        }
    }

    log::debug!(
        "page: {} fragments -> {} parameters",
        fragments.len(),
        record.parameters.len()
    );
    record
}

/// Build the report for a sequence of pages, one record per page
pub fn build_report<I>(pages: I, template: &TemplateConfig) -> ReportResult
where
    I: IntoIterator,
    I::Item: AsRef<[Fragment]>,
{
    pages
        .into_iter()
        .map(|page| extract_page(page.as_ref(), template))
        .fold(ReportResult::default(), ReportResult::fold_page)
}
