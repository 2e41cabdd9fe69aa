use crate::client::ApiClient;
use crate::view::{DashboardView, FieldEntry};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldDisplay {
    Text,
    Number,
    /// Text with a default when nothing was located
    TextOr(&'static str),
    Flag,
}

struct DashboardField {
    label: &'static str,
    tag: &'static str,
    display: FieldDisplay,
}

const fn text(label: &'static str, tag: &'static str) -> DashboardField {
    DashboardField {
        label,
        tag,
        display: FieldDisplay::Text,
    }
}

const SECTIONS: &[(&str, &[DashboardField])] = &[
    (
        "Origin Details",
        &[
            text("Company Name", "OriginCompany"),
            text("Address", "OriginAddress"),
            text("Phone", "OriginPhone"),
            text("Email", "OriginEmail"),
        ],
    ),
    (
        "Destination Details",
        &[
            text("Company Name", "DestinationCompany"),
            text("Address", "DestinationAddress"),
            text("Phone", "DestinationPhone"),
            text("Email", "DestinationEmail"),
        ],
    ),
    (
        "Shipment Details",
        &[
            text("Handling Unit Type", "HandlingUnitType"),
            DashboardField {
                label: "Quantity",
                tag: "Quantity",
                display: FieldDisplay::Number,
            },
            DashboardField {
                label: "Weight",
                tag: "Weight",
                display: FieldDisplay::Number,
            },
            DashboardField {
                label: "Weight Unit",
                tag: "WeightUnit",
                display: FieldDisplay::TextOr("Lbs"),
            },
            text("BOL No", "BOLNumber"),
            text("Carrier Pro No", "CarrierProNumber"),
            text("Customer Ref. ID", "CustomerReferenceID"),
            text("NMFC", "NMFC"),
        ],
    ),
    (
        "Options",
        &[
            DashboardField {
                label: "No NMFC Class on BOL",
                tag: "NoNMFCClassOnBOL",
                display: FieldDisplay::Flag,
            },
            DashboardField {
                label: "In Bond",
                tag: "InBond",
                display: FieldDisplay::Flag,
            },
            DashboardField {
                label: "Hazmat",
                tag: "Hazmat",
                display: FieldDisplay::Flag,
            },
        ],
    ),
    (
        "Reference Numbers",
        &[
            text("Order ID", "OrderID"),
            text("Shipment ID", "ShipmentID"),
            text("Transport ID", "TransportID"),
        ],
    ),
];

pub async fn run(file: &Path, server: &str, json: bool, field: Option<&str>) -> Result<()> {
    let client = ApiClient::new(server)?;

    if !json {
        println!("📄 Extracting information from {}...", file.display());
    }
    let content = client.extract(file).await?;
    let view = DashboardView::from_content(&content)
        .context("Extraction content is not valid JSON")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    match field {
        Some(tag) => print_field(&view, tag),
        None => print_dashboard(&view),
    }
    Ok(())
}

fn display_value(view: &DashboardView, field: &DashboardField) -> String {
    match field.display {
        FieldDisplay::Text => view.value_of(field.tag),
        FieldDisplay::TextOr(default) => {
            let value = view.value_of(field.tag);
            if value.is_empty() {
                default.to_string()
            } else {
                value
            }
        }
        FieldDisplay::Number => match view.number_of(field.tag) {
            Some(number) => number.to_string(),
            None => view.value_of(field.tag),
        },
        FieldDisplay::Flag => {
            if view.flag_of(field.tag) {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        }
    }
}

fn print_dashboard(view: &DashboardView) {
    if view.extracted_fields.is_empty() {
        println!("{} No fields were located on the document", style("⚠️").yellow());
    } else {
        println!(
            "{} Located {} field(s) across {} page(s)",
            style("✅").green(),
            view.extracted_fields.len(),
            view.pages.len()
        );
    }

    for (title, fields) in SECTIONS {
        println!();
        println!("{}", style(title).bold().cyan());
        for field in fields.iter() {
            let value = display_value(view, field);
            let pages = pages_of(view.extracted_fields.get(field.tag).unwrap_or_default());
            println!(
                "   {:<22} {} {}",
                style(field.label).dim(),
                value,
                style(pages).dim()
            );
        }
    }
}

fn pages_of(entries: &[FieldEntry]) -> String {
    let mut pages: Vec<u64> = entries.iter().filter_map(|e| e.page_number).collect();
    pages.dedup();
    match pages.as_slice() {
        [] => String::new(),
        [page] => format!("(page {})", page),
        _ => {
            let list: Vec<String> = pages.iter().map(u64::to_string).collect();
            format!("(pages {})", list.join(", "))
        }
    }
}

fn print_field(view: &DashboardView, tag: &str) {
    let Some(entries) = view.extracted_fields.get(tag) else {
        println!("{} No regions located for {}", style("⚠️").yellow(), tag);
        return;
    };

    println!("{}", style(tag).bold().cyan());
    for entry in entries {
        let page = entry
            .page_number
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let unit = entry
            .page_number
            .and_then(|p| view.pages.get(p.saturating_sub(1) as usize))
            .and_then(|info| info.unit.clone())
            .unwrap_or_default();
        let bbox = match entry.bounding_box {
            Some(b) => format!("({}, {}) - ({}, {}) {}", b[0], b[1], b[4], b[5], unit),
            None => "no bounding box".to_string(),
        };
        let value = match &entry.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("   page {}  {}  {}", page, value, style(bbox).dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view() -> DashboardView {
        DashboardView::from_value(&json!([
            {"template_field": "Quantity", "predicted_value": "3", "page": 1},
            {"template_field": "Weight", "predicted_value": "about 3200", "page": 1},
            {"template_field": "InBond", "text": "In Bond", "predicted_value": "True", "page": 2},
            {"template_field": "InBond", "text": "In Bond", "predicted_value": "True", "page": 2},
            {"template_field": "Hazmat", "text": "Hazmat", "predicted_value": null, "page": 1},
        ]))
    }

    fn field(tag: &'static str, display: FieldDisplay) -> DashboardField {
        DashboardField {
            label: tag,
            tag,
            display,
        }
    }

    #[test]
    fn test_display_values() {
        let view = view();
        assert_eq!(display_value(&view, &field("Quantity", FieldDisplay::Number)), "3");
        assert_eq!(display_value(&view, &field("Weight", FieldDisplay::Number)), "about 3200");
        assert_eq!(display_value(&view, &field("WeightUnit", FieldDisplay::TextOr("Lbs"))), "Lbs");
        assert_eq!(display_value(&view, &field("InBond", FieldDisplay::Flag)), "[x]");
        assert_eq!(display_value(&view, &field("Hazmat", FieldDisplay::Flag)), "[ ]");
        assert_eq!(display_value(&view, &field("Residential", FieldDisplay::Flag)), "[ ]");
        assert_eq!(display_value(&view, &field("NMFC", FieldDisplay::Text)), "");
    }

    #[test]
    fn test_pages_of() {
        let view = view();
        assert_eq!(pages_of(view.extracted_fields.get("InBond").unwrap()), "(page 2)");
        assert_eq!(pages_of(&[]), "");
    }

    #[test]
    fn test_sections_cover_dock_management_catalog() {
        let catalog = docex_extract::MappingCatalog::builtin();
        let fields = catalog.fields(docex_extract::DEFAULT_MAPPING).unwrap();
        let shown: Vec<&str> = SECTIONS
            .iter()
            .flat_map(|(_, fields)| fields.iter().map(|f| f.tag))
            .collect();

        assert_eq!(shown.len(), fields.len());
        for field in fields {
            assert!(shown.contains(&field.json_tag.as_str()), "{}", field.json_tag);
        }
    }
}
