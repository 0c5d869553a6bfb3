//! Output records
//!
//! Every optional field serializes as an explicit `null`: a missing unit or
//! reference range means "not on this report", never "not looked at".

use crate::ReportError;
use serde::Serialize;

/// Patient information collected from a page header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub external_ref: Option<String>,
}

impl PatientInfo {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.birth_date.is_none()
            && self.gender.is_none()
            && self.external_ref.is_none()
    }

    /// Fill fields that are still unset; values already present are kept.
    pub fn absorb(&mut self, other: PatientInfo) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.first_name, other.first_name);
        fill(&mut self.last_name, other.last_name);
        fill(&mut self.birth_date, other.birth_date);
        fill(&mut self.gender, other.gender);
        fill(&mut self.external_ref, other.external_ref);
    }
}

/// A reconstructed lab-result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabRow {
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub comment: Option<String>,
}

/// Comment text with no row to attach to on its page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Continuation {
    pub comment: String,
}

/// One entry of a page's parameter list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Parameter {
    Row(LabRow),
    Continuation(Continuation),
}

impl Parameter {
    pub fn comment(&self) -> Option<&str> {
        match self {
            Parameter::Row(row) => row.comment.as_deref(),
            Parameter::Continuation(c) => Some(&c.comment),
        }
    }

    pub fn as_row(&self) -> Option<&LabRow> {
        match self {
            Parameter::Row(row) => Some(row),
            Parameter::Continuation(_) => None,
        }
    }

    /// Attach comment text, newline-joined onto any existing comment
    fn append_comment(&mut self, text: String) {
        let slot = match self {
            Parameter::Row(row) => &mut row.comment,
            Parameter::Continuation(c) => {
                c.comment.push('\n');
                c.comment.push_str(&text);
                return;
            }
        };
        match slot {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&text);
            }
            None => *slot = Some(text),
        }
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    #[serde(flatten)]
    pub patient: PatientInfo,
    /// Rows in encounter order
    pub parameters: Vec<Parameter>,
}

impl PageRecord {
    pub fn push_row(&mut self, row: LabRow) {
        self.parameters.push(Parameter::Row(row));
    }

    /// Stitch comment text onto the last parameter of the page.
    ///
    /// A comment that opens a page (continued from the previous one) has
    /// nothing to attach to and becomes a standalone continuation entry.
    pub fn push_comment(&mut self, text: String) {
        match self.parameters.last_mut() {
            Some(last) => last.append_comment(text),
            None => self
                .parameters
                .push(Parameter::Continuation(Continuation { comment: text })),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &LabRow> {
        self.parameters.iter().filter_map(Parameter::as_row)
    }
}

/// Page records in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportResult {
    pub pages: Vec<PageRecord>,
}

impl ReportResult {
    /// Fold step appending one page to the report
    pub fn fold_page(mut self, page: PageRecord) -> Self {
        self.pages.push(page);
        self
    }

    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|p| p.rows().count()).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
