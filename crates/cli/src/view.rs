//! Dashboard view of an extraction result: regions grouped by field plus page geometry.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One located region of a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    /// Predicted value, or the OCR line text when the model gave none
    pub value: Value,
    /// Axis aligned polygon `[x1, y1, x2, y1, x2, y2, x1, y2]`
    pub bounding_box: Option<[f64; 8]>,
    pub page_number: Option<u64>,
    /// The model's value alone, null when it gave none
    #[serde(skip)]
    pub predicted: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: Option<String>,
}

impl PageInfo {
    fn placeholder() -> Self {
        Self {
            width: Some(1.0),
            height: Some(1.0),
            unit: Some("pixel".to_string()),
        }
    }
}

/// Fields keep the order the service returned them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGroups(Vec<(String, Vec<FieldEntry>)>);

impl FieldGroups {
    pub fn get(&self, tag: &str) -> Option<&[FieldEntry]> {
        self.0
            .iter()
            .find(|(key, _)| key == tag)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, tag: &str, entry: FieldEntry) {
        match self.0.iter_mut().find(|(key, _)| key == tag) {
            Some((_, entries)) => entries.push(entry),
            None => self.0.push((tag.to_string(), vec![entry])),
        }
    }
}

impl Serialize for FieldGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tag, entries) in &self.0 {
            map.serialize_entry(tag, entries)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub extracted_fields: FieldGroups,
    /// One entry per page, page 1 first
    pub pages: Vec<PageInfo>,
}

impl DashboardView {
    /// Builds the view from the `content` string of an extraction response.
    pub fn from_content(content: &str) -> serde_json::Result<Self> {
        let raw: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(&raw))
    }

    /// A list is taken as the region list, an object contributes its `extracted_fields` list.
    pub fn from_value(raw: &Value) -> Self {
        let empty = Vec::new();
        let regions = match raw {
            Value::Array(regions) => regions,
            Value::Object(object) => object
                .get("extracted_fields")
                .and_then(Value::as_array)
                .unwrap_or(&empty),
            _ => &empty,
        };

        let mut groups = FieldGroups::default();
        let mut seen_pages: Vec<(u64, PageInfo)> = Vec::new();

        for region in regions {
            let Some(tag) = region.get("template_field").and_then(Value::as_str) else {
                continue;
            };

            let page = region.get("page").and_then(Value::as_u64);
            groups.push(
                tag,
                FieldEntry {
                    value: value_or_text(region),
                    bounding_box: bounding_box(region),
                    page_number: page,
                    predicted: region.get("predicted_value").cloned().unwrap_or(Value::Null),
                },
            );

            if let Some(page) = page.filter(|p| *p > 0) {
                if !seen_pages.iter().any(|(seen, _)| *seen == page) {
                    seen_pages.push((
                        page,
                        PageInfo {
                            width: number(region, "width"),
                            height: number(region, "height"),
                            unit: region.get("unit").and_then(Value::as_str).map(str::to_string),
                        },
                    ));
                }
            }
        }

        let page_count = seen_pages.iter().map(|(page, _)| *page).max().unwrap_or(1);
        let pages = (1..=page_count)
            .map(|page| {
                seen_pages
                    .iter()
                    .find(|(seen, _)| *seen == page)
                    .or_else(|| seen_pages.first())
                    .map(|(_, info)| info.clone())
                    .unwrap_or_else(PageInfo::placeholder)
            })
            .collect();

        Self {
            extracted_fields: groups,
            pages,
        }
    }

    /// Value of the first region located for `tag`, as display text.
    pub fn value_of(&self, tag: &str) -> String {
        let Some(entry) = self.extracted_fields.get(tag).and_then(|e| e.first()) else {
            return String::new();
        };
        match &entry.value {
            Value::Null | Value::Bool(false) => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
            other => other.to_string(),
        }
    }

    /// Whether the model marked a checkbox field as selected. OCR text never checks a box.
    pub fn flag_of(&self, tag: &str) -> bool {
        self.extracted_fields
            .get(tag)
            .and_then(|entries| entries.first())
            .map_or(false, |entry| is_checked(&entry.predicted))
    }

    /// Numeric value of a field, 0 when absent.
    pub fn number_of(&self, tag: &str) -> Option<f64> {
        let value = self.value_of(tag);
        if value.is_empty() {
            return Some(0.0);
        }
        value.trim().replace(',', "").parse().ok()
    }
}

fn value_or_text(region: &Value) -> Value {
    match region.get("predicted_value") {
        Some(value) if !value.is_null() => value.clone(),
        _ => region.get("text").cloned().unwrap_or(Value::Null),
    }
}

fn is_checked(predicted: &Value) -> bool {
    match predicted {
        Value::Bool(checked) => *checked,
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && !["false", "no", "0"].iter().any(|off| s.eq_ignore_ascii_case(off))
        }
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::Object(object) => object.get("selected").map_or(false, is_checked),
        Value::Null | Value::Array(_) => false,
    }
}

fn number(region: &Value, key: &str) -> Option<f64> {
    region.get(key).and_then(Value::as_f64)
}

fn bounding_box(region: &Value) -> Option<[f64; 8]> {
    let x1 = number(region, "top_left_x")?;
    let y1 = number(region, "top_left_y")?;
    let x2 = number(region, "bottom_right_x")?;
    let y2 = number(region, "bottom_right_y")?;
    Some([x1, y1, x2, y1, x2, y2, x1, y2])
}
