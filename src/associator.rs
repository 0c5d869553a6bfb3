//! Row association by vertical proximity
//!
//! A fragment in the parameter-name band anchors a row. Its value/unit
//! partner is the fragment to its right within the row window, and the
//! reference range is found the same way to the right of the value.

use crate::extractor::Fragment;
use crate::record::LabRow;
use crate::template::{MatchPolicy, TemplateConfig};

/// What a body fragment resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    /// A complete lab row
    Row(LabRow),
    /// Comment text, to be stitched onto the preceding row
    Comment(String),
}

/// Resolve a body fragment.
///
/// Returns `None` unless the fragment sits in the parameter-name band. An
/// anchor without a value partner is comment text, not a row.
pub fn associate(
    fragment: &Fragment,
    page: &[Fragment],
    template: &TemplateConfig,
) -> Option<Association> {
    template.anchor_band(fragment.left_x)?;

    let Some(value_unit) = find_partner(fragment, page, template) else {
        log::trace!("no row partner for {:?}, treating as comment", fragment.text);
        return Some(Association::Comment(fragment.text.trim().to_string()));
    };

    let (value, unit) = split_value_unit(value_unit.text.trim());
    let reference_range =
        find_partner(value_unit, page, template).map(|f| f.text.trim().to_string());

    Some(Association::Row(LabRow {
        name: fragment.text.trim().to_string(),
        value,
        unit,
        reference_range,
        comment: None,
    }))
}

/// Find the fragment right of `origin` on the same row.
///
/// Candidates lie strictly right of `origin` and inside the template's row
/// window; which candidate wins depends on the template's match policy.
pub fn find_partner<'a>(
    origin: &Fragment,
    page: &'a [Fragment],
    template: &TemplateConfig,
) -> Option<&'a Fragment> {
    let mut candidates = page.iter().filter(|f| {
        f.left_x > origin.left_x && template.in_row_window(origin.bottom_y, f.bottom_y)
    });

    match template.match_policy {
        MatchPolicy::FirstEncountered => candidates.next(),
        MatchPolicy::Nearest => candidates.min_by(|a, b| {
            let dy_a = (a.bottom_y - origin.bottom_y).abs();
            let dy_b = (b.bottom_y - origin.bottom_y).abs();
            dy_a.total_cmp(&dy_b)
                .then_with(|| (a.left_x - origin.left_x).total_cmp(&(b.left_x - origin.left_x)))
        }),
    }
}

/// "98 mg/dL" -> ("98", Some("mg/dL")); anything not exactly two
/// space-separated tokens is all value.
pub fn split_value_unit(text: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = text.split(' ').collect();
    match parts.as_slice() {
        [value, unit] => (value.to_string(), Some(unit.to_string())),
        _ => (text.to_string(), None),
    }
}
