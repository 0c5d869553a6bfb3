//! Fragment classification by coordinate band
//!
//! Header fragments are parsed into patient fields by the band they sit in;
//! body fragments are handed to the row associator.

use crate::associator::{associate, Association};
use crate::extractor::Fragment;
use crate::record::PatientInfo;
use crate::template::{BandRole, Region, TemplateConfig};

/// What a single fragment contributes to its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Patient fields from a header band
    Patient(PatientInfo),
    /// A lab row or comment from the body
    Body(Association),
    /// Outside every configured band, or malformed
    Ignored,
}

/// Classify one fragment against the template.
///
/// `page` is the full fragment set of the fragment's page; body fragments
/// search it for their row partners.
pub fn classify_fragment(
    fragment: &Fragment,
    page: &[Fragment],
    template: &TemplateConfig,
) -> Classification {
    match template.region_of(fragment.bottom_y) {
        Region::Header => {
            let Some(band) = template.header_band(fragment.left_x) else {
                return Classification::Ignored;
            };
            let info = match band.role {
                BandRole::PatientName => parse_name(&fragment.text),
                BandRole::BirthGender => parse_birth_gender(&fragment.text),
                BandRole::ExternalRef { label_len } => {
                    Some(parse_external_ref(&fragment.text, label_len))
                }
                BandRole::ParameterName => None,
            };
            match info {
                Some(info) => Classification::Patient(info),
                None => {
                    log::debug!(
                        "ignoring malformed {} field {:?}",
                        band.name,
                        fragment.text
                    );
                    Classification::Ignored
                }
            }
        }
        Region::Body => match associate(fragment, page, template) {
            Some(association) => Classification::Body(association),
            None => Classification::Ignored,
        },
        Region::Margin => Classification::Ignored,
    }
}

/// "Last, First" split on the first comma; anything else is not a name
pub fn parse_name(text: &str) -> Option<PatientInfo> {
    let parts: Vec<&str> = text.trim().split(',').collect();
    let [last, first] = parts.as_slice() else {
        return None;
    };
    Some(PatientInfo {
        first_name: Some(first.trim().to_string()),
        last_name: Some(last.trim().to_string()),
        ..Default::default()
    })
}

/// "birth date / gender"
pub fn parse_birth_gender(text: &str) -> Option<PatientInfo> {
    let parts: Vec<&str> = text.trim().split('/').collect();
    let [birth, gender] = parts.as_slice() else {
        return None;
    };
    Some(PatientInfo {
        birth_date: Some(birth.trim().to_string()),
        gender: Some(gender.trim().to_string()),
        ..Default::default()
    })
}

/// Drop a fixed-length label; the remainder is kept as is.
///
/// The label is counted in characters. Text no longer than the label yields
/// an empty reference.
pub fn parse_external_ref(text: &str, label_len: usize) -> PatientInfo {
    let value: String = text.trim().chars().skip(label_len).collect();
    PatientInfo {
        external_ref: Some(value),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LabRow;

    #[test]
    fn test_parse_name() {
        let info = parse_name("Müller, Hans\n").unwrap();
        assert_eq!(info.last_name.as_deref(), Some("Müller"));
        assert_eq!(info.first_name.as_deref(), Some("Hans"));
    }

    #[test]
    fn test_parse_name_rejects_wrong_token_count() {
        assert!(parse_name("Müller Hans").is_none());
        assert!(parse_name("Müller, Hans, Dr.").is_none());
    }

    #[test]
    fn test_parse_birth_gender() {
        let info = parse_birth_gender("01.02.1970 / M").unwrap();
        assert_eq!(info.birth_date.as_deref(), Some("01.02.1970"));
        assert_eq!(info.gender.as_deref(), Some("M"));
        assert!(parse_birth_gender("01/02/1970 / M").is_none());
        assert!(parse_birth_gender("01.02.1970").is_none());
    }

    #[test]
    fn test_parse_external_ref() {
        let info = parse_external_ref("Ext.-Nr.: 123 456", 10);
        assert_eq!(info.external_ref.as_deref(), Some("123 456"));
        let short = parse_external_ref("Ext.", 10);
        assert_eq!(short.external_ref.as_deref(), Some(""));
    }

    #[test]
    fn test_header_fragment_outside_bands_is_ignored() {
        let t = TemplateConfig::default();
        let f = Fragment::new("Labor Dr. Beispiel", 200.0, 514.5);
        assert_eq!(classify_fragment(&f, &[f.clone()], &t), Classification::Ignored);
    }

    #[test]
    fn test_margin_fragment_is_ignored() {
        let t = TemplateConfig::default();
        // Column titles sit between header and body
        let f = Fragment::new("Untersuchung", 65.0, 470.0);
        assert_eq!(classify_fragment(&f, &[f.clone()], &t), Classification::Ignored);
    }

    #[test]
    fn test_header_name_band() {
        let t = TemplateConfig::default();
        let f = Fragment::new("Müller, Hans", 55.0, 514.0);
        match classify_fragment(&f, &[f.clone()], &t) {
            Classification::Patient(info) => {
                assert_eq!(info.last_name.as_deref(), Some("Müller"));
                assert_eq!(info.first_name.as_deref(), Some("Hans"));
            }
            other => panic!("expected patient info, got {:?}", other),
        }
    }

    #[test]
    fn test_body_anchor_becomes_row() {
        let t = TemplateConfig::default();
        let page = vec![
            Fragment::new("Glucose", 65.0, 400.0),
            Fragment::new("98 mg/dL", 200.0, 401.0),
        ];
        assert_eq!(
            classify_fragment(&page[0], &page, &t),
            Classification::Body(Association::Row(LabRow {
                name: "Glucose".into(),
                value: "98".into(),
                unit: Some("mg/dL".into()),
                reference_range: None,
                comment: None,
            }))
        );
        // The value fragment contributes nothing on its own
        assert_eq!(classify_fragment(&page[1], &page, &t), Classification::Ignored);
    }
}
