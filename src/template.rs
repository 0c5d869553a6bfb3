//! Report template configuration
//!
//! A template is a table of horizontal bands plus the vertical thresholds
//! that split a page into header and body. The coordinates are tied to one
//! report layout as rendered by one decoder, so a new layout (or a new
//! decoding backend) means a new table, not new code.

use crate::ReportError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Semantic role of a horizontal band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BandRole {
    /// "Last, First" in the header
    PatientName,
    /// "birth date / gender" in the header
    BirthGender,
    /// External reference number behind a fixed-length label
    ExternalRef {
        /// Number of characters of label text preceding the value
        label_len: usize,
    },
    /// Lab parameter names (row anchors) in the body
    ParameterName,
}

impl BandRole {
    /// Whether this role is resolved in the header region
    pub fn is_header(&self) -> bool {
        !matches!(self, BandRole::ParameterName)
    }
}

/// A horizontal band, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub min_x: f32,
    pub max_x: f32,
    pub role: BandRole,
}

impl Band {
    pub fn new(name: &str, min_x: f32, max_x: f32, role: BandRole) -> Self {
        Self {
            name: name.to_string(),
            min_x,
            max_x,
            role,
        }
    }

    pub fn contains(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }
}

/// How the row associator picks among several partner candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Take the first candidate in page enumeration order
    #[default]
    FirstEncountered,
    /// Take the candidate with the smallest vertical distance, then the
    /// smallest horizontal gap; remaining ties go to enumeration order
    Nearest,
}

/// Vertical region a fragment falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Patient information line
    Header,
    /// Lab result rows and comments
    Body,
    /// Everything else (page furniture, column titles, blank margin)
    Margin,
}

/// Coordinate configuration for one report layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Inclusive bottom-y range of the patient information line
    pub header_min_y: f32,
    pub header_max_y: f32,
    /// Body fragments sit strictly below this bottom-y
    pub body_max_y: f32,
    /// Half-width of the vertical window used for row matching
    pub row_tolerance: f32,
    /// Band table, consulted in order
    pub bands: Vec<Band>,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            header_min_y: 514.0,
            header_max_y: 515.0,
            body_max_y: 461.0,
            row_tolerance: 5.0,
            bands: vec![
                Band::new("name", 55.0, 56.0, BandRole::PatientName),
                Band::new("birth_gender", 361.0, 362.0, BandRole::BirthGender),
                Band::new(
                    "external_ref",
                    464.0,
                    465.0,
                    BandRole::ExternalRef { label_len: 10 },
                ),
                Band::new("parameter", 65.0, 66.0, BandRole::ParameterName),
            ],
            match_policy: MatchPolicy::FirstEncountered,
        }
    }
}

impl TemplateConfig {
    /// Parse and validate a template from JSON
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let template: TemplateConfig = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    /// Load and validate a template from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject tables that can never match anything
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.header_min_y > self.header_max_y {
            return Err(ReportError::InvalidTemplate(format!(
                "header range is empty: {} > {}",
                self.header_min_y, self.header_max_y
            )));
        }
        if self.row_tolerance < 0.0 {
            return Err(ReportError::InvalidTemplate(format!(
                "row tolerance must not be negative: {}",
                self.row_tolerance
            )));
        }
        for band in &self.bands {
            if band.min_x > band.max_x {
                return Err(ReportError::InvalidTemplate(format!(
                    "band '{}' is empty: {} > {}",
                    band.name, band.min_x, band.max_x
                )));
            }
        }
        if !self
            .bands
            .iter()
            .any(|b| b.role == BandRole::ParameterName)
        {
            return Err(ReportError::InvalidTemplate(
                "no parameter band configured".to_string(),
            ));
        }
        Ok(())
    }

    pub fn region_of(&self, bottom_y: f32) -> Region {
        if bottom_y >= self.header_min_y && bottom_y <= self.header_max_y {
            Region::Header
        } else if bottom_y < self.body_max_y {
            Region::Body
        } else {
            Region::Margin
        }
    }

    /// First header band containing `x`
    pub fn header_band(&self, x: f32) -> Option<&Band> {
        self.bands
            .iter()
            .find(|b| b.role.is_header() && b.contains(x))
    }

    /// First parameter-name band containing `x`
    pub fn anchor_band(&self, x: f32) -> Option<&Band> {
        self.bands
            .iter()
            .find(|b| b.role == BandRole::ParameterName && b.contains(x))
    }

    /// Whether `candidate_y` lies in the row window around `origin_y`.
    ///
    /// Coordinates are truncated to whole units and the window is half-open,
    /// `[trunc(origin - tol), trunc(origin + tol))`, which is what the layout
    /// constants were tuned against.
    pub fn in_row_window(&self, origin_y: f32, candidate_y: f32) -> bool {
        let lo = (origin_y - self.row_tolerance).trunc();
        let hi = (origin_y + self.row_tolerance).trunc();
        let c = candidate_y.trunc();
        c >= lo && c < hi
    }
}
