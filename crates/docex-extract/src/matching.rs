//! Locating extracted values and form labels on OCR lines.

use crate::layout::{DocumentLayout, LineRecord};
use crate::mapping::FieldSpec;
use crate::similarity::string_similarity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Highest dissimilarity accepted by the fuzzy fallback
pub const DEFAULT_MATCH_THRESHOLD: usize = 0;

/// A matched OCR line annotated with the field it supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRegion {
    pub text: String,
    pub top_left_x: f64,
    pub top_left_y: f64,
    pub bottom_right_x: f64,
    pub bottom_right_y: f64,
    /// Page height in `unit`
    pub height: f64,
    /// Page width in `unit`
    pub width: f64,
    pub unit: String,
    pub page: u32,
    pub line_numbers: u32,
    pub predicted_value: Option<String>,
    pub field_name: Option<String>,
    pub document_id: String,
    pub template_field: String,
}

/// Indices of the lines matching every non-blank line of `form_key`.
///
/// Each search line is tried as a substring of a single line, then of two
/// adjacent lines joined by a space, then through a fuzzy comparison.
pub fn find_all_matching_indices(
    lines: &[LineRecord],
    form_key: &str,
    threshold: usize,
) -> Vec<usize> {
    let search_lines: Vec<String> = form_key
        .split('\n')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if search_lines.is_empty() {
        return Vec::new();
    }

    let texts: Vec<String> = lines
        .iter()
        .map(|line| line.text.trim().to_lowercase())
        .collect();
    let mut found = Vec::new();

    for search in &search_lines {
        if let Some(index) = texts.iter().position(|text| text.contains(search.as_str())) {
            found.push(index);
            continue;
        }

        let adjacent = texts
            .windows(2)
            .position(|pair| format!("{} {}", pair[0], pair[1]).contains(search.as_str()));
        if let Some(index) = adjacent {
            found.push(index);
            found.push(index + 1);
            continue;
        }

        let fuzzy = texts.iter().position(|text| {
            let report = string_similarity(search, text);
            if report.text_length > report.subtext_length && report.subtext_length == 1 {
                return false;
            }
            report.text_length.abs_diff(report.subtext_length) < 2
                && report.dissimilarity_score <= threshold
        });
        if let Some(index) = fuzzy {
            found.push(index);
        }
    }

    found.sort_unstable();
    found.dedup();
    found
}

/// Picks the lines that best evidence a field and the name to label them with.
///
/// When both labels and a value are known, value matches on pages where a
/// label also matched win.
pub fn find_best_matched_indices(
    form_keys: &[String],
    value: Option<&str>,
    lines: &[LineRecord],
    template_field: &str,
) -> (Vec<usize>, Option<String>) {
    let value = value.filter(|v| !v.is_empty());
    let first_key = form_keys.first().cloned();

    match (form_keys.is_empty(), value) {
        (false, Some(value)) => {
            let mut all_key_indices = Vec::new();
            let mut keys_by_page: BTreeMap<u32, Vec<&String>> = BTreeMap::new();
            for key in form_keys {
                let indices = find_all_matching_indices(lines, key, DEFAULT_MATCH_THRESHOLD);
                for &index in &indices {
                    let page_keys = keys_by_page.entry(lines[index].geometry.page).or_default();
                    if !page_keys.contains(&key) {
                        page_keys.push(key);
                    }
                }
                all_key_indices.extend(indices);
            }

            let value_indices = find_all_matching_indices(lines, value, DEFAULT_MATCH_THRESHOLD);
            let mut values_by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
            for &index in &value_indices {
                values_by_page
                    .entry(lines[index].geometry.page)
                    .or_default()
                    .push(index);
            }

            let mut matched = Vec::new();
            let mut name = None;
            for (page, indices) in &values_by_page {
                if let Some(keys) = keys_by_page.get(page) {
                    matched.extend(indices.iter().copied());
                    name = keys.first().map(|key| (*key).clone());
                }
            }
            if !matched.is_empty() {
                return (matched, name);
            }

            if !value_indices.is_empty() {
                (value_indices, first_key)
            } else if !all_key_indices.is_empty() {
                (all_key_indices, first_key)
            } else {
                (Vec::new(), None)
            }
        }
        (false, None) => {
            let matched = form_keys
                .iter()
                .flat_map(|key| find_all_matching_indices(lines, key, DEFAULT_MATCH_THRESHOLD))
                .collect();
            (matched, first_key)
        }
        (true, Some(value)) => (
            find_all_matching_indices(lines, value, DEFAULT_MATCH_THRESHOLD),
            Some(template_field.to_string()),
        ),
        (true, None) => (Vec::new(), None),
    }
}

/// One region per distinct line index, in line order.
pub fn create_field_regions(
    indices: &[usize],
    field_name: Option<&str>,
    value: Option<&str>,
    template_field: &str,
    document_id: &str,
    lines: &[LineRecord],
) -> Vec<FieldRegion> {
    let mut unique: Vec<usize> = indices.to_vec();
    unique.sort_unstable();
    unique.dedup();

    unique
        .into_iter()
        .filter_map(|index| lines.get(index))
        .map(|line| FieldRegion {
            text: line.text.clone(),
            top_left_x: line.quad.top_left_x,
            top_left_y: line.quad.top_left_y,
            bottom_right_x: line.quad.bottom_right_x,
            bottom_right_y: line.quad.bottom_right_y,
            height: line.geometry.height,
            width: line.geometry.width,
            unit: line.geometry.unit.clone(),
            page: line.geometry.page,
            line_numbers: line.line_numbers,
            predicted_value: value.map(str::to_string),
            field_name: field_name.map(str::to_string),
            document_id: document_id.to_string(),
            template_field: template_field.to_string(),
        })
        .collect()
}

/// Text to look for on the page for a model supplied value.
pub fn search_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) => Some(value.to_string()),
    }
}

/// Form labels cited by the model; a bare string counts as a single label.
fn form_keys_of(info: &serde_json::Map<String, Value>) -> Vec<String> {
    match info.get("form_key") {
        Some(Value::Array(keys)) => keys
            .iter()
            .filter_map(|key| match key {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(key)) => vec![key.clone()],
        _ => Vec::new(),
    }
}

/// Regions for every catalog field, in catalog order.
pub fn locate_fields(
    extracted_fields: &Value,
    fields: &[FieldSpec],
    layout: &DocumentLayout,
) -> Vec<FieldRegion> {
    let mut regions = Vec::new();

    for field in fields {
        let template_field = field.json_tag.as_str();
        let info = extracted_fields
            .get(template_field)
            .and_then(Value::as_object);

        let (value, form_keys) = match info {
            Some(info) => (
                info.get("value").and_then(search_value),
                form_keys_of(info),
            ),
            None => (None, Vec::new()),
        };

        let (indices, field_name) = find_best_matched_indices(
            &form_keys,
            value.as_deref(),
            &layout.lines,
            template_field,
        );
        if indices.is_empty() {
            tracing::debug!(field = template_field, "No OCR lines matched field");
            continue;
        }

        regions.extend(create_field_regions(
            &indices,
            field_name.as_deref(),
            value.as_deref(),
            template_field,
            &layout.document_id,
            &layout.lines,
        ));
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PageGeometry, Quad};
    use crate::mapping::{DataType, FieldSpec};
    use serde_json::json;

    fn line(text: &str, page: u32, y: f64) -> LineRecord {
        LineRecord {
            text: text.to_string(),
            quad: Quad {
                top_left_x: 1.0,
                top_left_y: y - 0.2,
                top_right_x: 4.0,
                top_right_y: y - 0.2,
                bottom_right_x: 4.0,
                bottom_right_y: y,
                bottom_left_x: 1.0,
                bottom_left_y: y,
            },
            geometry: PageGeometry {
                page,
                angle: 0.0,
                width: 8.5,
                height: 11.0,
                unit: "inch".to_string(),
            },
            spans: Vec::new(),
            page_spans: Vec::new(),
            line_numbers: (y * 10.0) as u32,
        }
    }

    fn sample_lines() -> Vec<LineRecord> {
        vec![
            line("Shipper", 1, 1.0),
            line("ACME Logistics", 1, 1.5),
            line("BOL No:", 1, 2.0),
            line("123456588", 1, 2.5),
            line("Ship To", 2, 1.0),
            line("Eagle Manufacturer", 2, 1.5),
            line("123456588", 2, 3.0),
        ]
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let lines = sample_lines();
        assert_eq!(find_all_matching_indices(&lines, "acme", 0), vec![1]);
        assert_eq!(find_all_matching_indices(&lines, "  BOL NO  ", 0), vec![2]);
    }

    #[test]
    fn test_multi_line_key_collects_each_line() {
        let lines = sample_lines();
        assert_eq!(
            find_all_matching_indices(&lines, "Shipper\nShip To\n\n", 0),
            vec![0, 4]
        );
    }

    #[test]
    fn test_adjacent_lines_match_when_split() {
        let lines = sample_lines();
        assert_eq!(
            find_all_matching_indices(&lines, "bol no: 1234", 0),
            vec![2, 3]
        );
    }

    #[test]
    fn test_blank_key_matches_nothing() {
        let lines = sample_lines();
        assert!(find_all_matching_indices(&lines, " \n ", 0).is_empty());
        assert!(find_all_matching_indices(&lines, "not on the page", 0).is_empty());
    }

    #[test]
    fn test_fuzzy_match_respects_threshold() {
        let lines = vec![line("Hazmat", 1, 1.0)];
        assert!(find_all_matching_indices(&lines, "hazmet", 0).is_empty());
        assert_eq!(find_all_matching_indices(&lines, "hazmet", 2), vec![0]);
    }

    #[test]
    fn test_fuzzy_match_tolerates_trailing_noise_in_key() {
        let lines = vec![line("Hazmat", 1, 1.0)];
        assert_eq!(find_all_matching_indices(&lines, "hazmatt", 0), vec![0]);
    }

    #[test]
    fn test_value_on_key_page_wins() {
        let lines = sample_lines();
        let (indices, name) = find_best_matched_indices(
            &keys(&["Consignee", "Ship To"]),
            Some("Eagle Manufacturer"),
            &lines,
            "DestinationCompany",
        );
        assert_eq!(indices, vec![5]);
        assert_eq!(name.as_deref(), Some("Ship To"));
    }

    #[test]
    fn test_first_value_occurrence_is_used() {
        let lines = sample_lines();
        // the value also appears on page 2, but only its first occurrence is matched
        let (indices, name) = find_best_matched_indices(
            &keys(&["Ship To"]),
            Some("123456588"),
            &lines,
            "BOLNumber",
        );
        assert_eq!(indices, vec![3]);
        assert_eq!(name.as_deref(), Some("Ship To"));
    }

    #[test]
    fn test_value_without_common_page_falls_back_to_value() {
        let lines = sample_lines();
        let (indices, name) = find_best_matched_indices(
            &keys(&["Consignee", "Receiver"]),
            Some("Eagle Manufacturer"),
            &lines,
            "DestinationCompany",
        );
        assert_eq!(indices, vec![5]);
        assert_eq!(name.as_deref(), Some("Consignee"));
    }

    #[test]
    fn test_keys_used_when_value_missing_from_page() {
        let lines = sample_lines();
        let (indices, name) = find_best_matched_indices(
            &keys(&["BOL No"]),
            Some("999"),
            &lines,
            "BOLNumber",
        );
        assert_eq!(indices, vec![2]);
        assert_eq!(name.as_deref(), Some("BOL No"));
    }

    #[test]
    fn test_value_only_uses_template_field_name() {
        let lines = sample_lines();
        let (indices, name) =
            find_best_matched_indices(&[], Some("acme logistics"), &lines, "OriginCompany");
        assert_eq!(indices, vec![1]);
        assert_eq!(name.as_deref(), Some("OriginCompany"));

        let (indices, name) = find_best_matched_indices(&[], Some(""), &lines, "OriginCompany");
        assert!(indices.is_empty());
        assert!(name.is_none());
    }

    #[test]
    fn test_keys_only_concatenates_matches() {
        let lines = sample_lines();
        let (indices, name) =
            find_best_matched_indices(&keys(&["Ship To", "Shipper"]), None, &lines, "Origin");
        assert_eq!(indices, vec![4, 0]);
        assert_eq!(name.as_deref(), Some("Ship To"));
    }

    #[test]
    fn test_create_field_regions_dedups_in_order() {
        let lines = sample_lines();
        let regions = create_field_regions(
            &[3, 1, 3],
            Some("BOL No"),
            Some("123456588"),
            "BOLNumber",
            "doc-1",
            &lines,
        );

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].text, "ACME Logistics");
        assert_eq!(regions[1].text, "123456588");
        assert_eq!(regions[1].width, 8.5);
        assert_eq!(regions[1].template_field, "BOLNumber");
        assert_eq!(regions[1].document_id, "doc-1");
    }

    #[test]
    fn test_search_value_conversions() {
        assert_eq!(search_value(&json!("  S1539964 ")).as_deref(), Some("S1539964"));
        assert_eq!(search_value(&json!(true)).as_deref(), Some("True"));
        assert_eq!(search_value(&json!(3200)).as_deref(), Some("3200"));
        assert_eq!(search_value(&json!(["a", "b"])).as_deref(), Some("[\"a\",\"b\"]"));
        assert_eq!(search_value(&json!({"selected": true})), None);
        assert_eq!(search_value(&Value::Null), None);
    }

    #[test]
    fn test_locate_fields_in_catalog_order() {
        let layout = DocumentLayout {
            document_id: "doc-9".to_string(),
            lines: sample_lines(),
            words: Vec::new(),
        };
        let fields = vec![
            FieldSpec {
                form_field: "BOL No".to_string(),
                json_tag: "BOLNumber".to_string(),
                data_type: DataType::Text,
                notes: None,
                source_page: 1,
            },
            FieldSpec {
                form_field: "Origin - Company Name".to_string(),
                json_tag: "OriginCompany".to_string(),
                data_type: DataType::Text,
                notes: None,
                source_page: 1,
            },
            FieldSpec {
                form_field: "Hazmat".to_string(),
                json_tag: "Hazmat".to_string(),
                data_type: DataType::Checkbox,
                notes: None,
                source_page: 1,
            },
        ];
        let extracted = json!({
            "OriginCompany": {"value": "ACME Logistics", "form_key": ["Shipper"]},
            "BOLNumber": {"value": "123456588", "form_key": "BOL No:"},
            "Hazmat": {"value": {"selected": false}, "form_key": []}
        });

        let regions = locate_fields(&extracted, &fields, &layout);
        let summary: Vec<(&str, &str)> = regions
            .iter()
            .map(|r| (r.template_field.as_str(), r.text.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![("BOLNumber", "123456588"), ("OriginCompany", "ACME Logistics")]
        );
        assert_eq!(regions[0].field_name.as_deref(), Some("BOL No:"));
        assert_eq!(regions[0].document_id, "doc-9");
    }
}
