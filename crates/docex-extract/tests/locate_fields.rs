use docex_extract::{document_id, locate_fields, page_content, AnalyzeResult, DocumentLayout, MappingCatalog};
use serde_json::json;

fn analyze_result() -> AnalyzeResult {
    serde_json::from_value(json!({
        "apiVersion": "2024-11-30",
        "modelId": "prebuilt-layout",
        "content": "BOL Number: 77\nShip To\nEagle Manufacturer",
        "pages": [{
            "pageNumber": 1,
            "angle": 0,
            "width": 8.5,
            "height": 11,
            "unit": "inch",
            "spans": [{"offset": 0, "length": 41}],
            "lines": [
                {
                    "content": "BOL Number: 77",
                    "polygon": [1.0, 0.8, 3.0, 0.8, 3.0, 1.0, 1.0, 1.0],
                    "spans": [{"offset": 0, "length": 14}]
                },
                {
                    "content": "Ship To",
                    "polygon": [1.0, 1.8, 2.0, 1.8, 2.0, 2.0, 1.0, 2.0],
                    "spans": [{"offset": 15, "length": 7}]
                },
                {
                    "content": "Eagle Manufacturer",
                    "polygon": [3.0, 1.8, 5.0, 1.8, 5.0, 1.995, 3.0, 1.995],
                    "spans": [{"offset": 23, "length": 18}]
                }
            ],
            "words": []
        }]
    }))
    .unwrap()
}

fn catalog() -> MappingCatalog {
    MappingCatalog::from_json_str(
        r#"{"bol": [
            {"FormField": "BOL No", "JSONTag": "BOLNumber", "DataType": "Text"},
            {"FormField": "Consignee", "JSONTag": "DestinationCompany", "DataType": "Text"},
            {"FormField": "Hazmat", "JSONTag": "Hazmat", "DataType": "Checkbox"}
        ]}"#,
    )
    .unwrap()
}

#[test]
fn test_rows_on_one_baseline_read_left_to_right() {
    let layout = DocumentLayout::from_analyze_result(&analyze_result(), "doc");

    let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["BOL Number: 77", "Ship To", "Eagle Manufacturer"]);
    let line_numbers: Vec<u32> = layout.lines.iter().map(|l| l.line_numbers).collect();
    assert_eq!(line_numbers, vec![1, 2, 2]);
    assert_eq!(layout.lines[2].spans[0].content, "Eagle Manufacturer");
    assert_eq!(layout.pages(), vec![1]);
}

#[test]
fn test_page_content_joins_lines() {
    let content = page_content(&analyze_result());
    assert_eq!(content[&1], "BOL Number: 77\nShip To\nEagle Manufacturer");
}

#[test]
fn test_mapped_fields_are_located_in_catalog_order() {
    let bytes = b"%PDF-1.7 fixture";
    let layout = DocumentLayout::from_analyze_result(&analyze_result(), document_id(bytes));
    let extracted = json!({
        "BOLNumber": {"value": 77, "form_key": "BOL Number"},
        "DestinationCompany": {"value": "Eagle Manufacturer", "form_key": ["Ship To"]},
        "Hazmat": {"value": {"selected": false}, "form_key": []}
    });

    let regions = locate_fields(&extracted, catalog().fields("bol").unwrap(), &layout);

    assert_eq!(regions.len(), 2);

    assert_eq!(regions[0].template_field, "BOLNumber");
    assert_eq!(regions[0].text, "BOL Number: 77");
    assert_eq!(regions[0].predicted_value.as_deref(), Some("77"));
    assert_eq!(regions[0].field_name.as_deref(), Some("BOL Number"));

    let consignee = &regions[1];
    assert_eq!(consignee.template_field, "DestinationCompany");
    assert_eq!(consignee.text, "Eagle Manufacturer");
    assert_eq!(consignee.field_name.as_deref(), Some("Ship To"));
    assert_eq!(consignee.top_left_x, 3.0);
    assert_eq!(consignee.bottom_right_y, 1.995);
    assert_eq!(consignee.width, 8.5);
    assert_eq!(consignee.height, 11.0);
    assert_eq!(consignee.unit, "inch");
    assert_eq!(consignee.page, 1);
    assert_eq!(consignee.line_numbers, 2);
    assert_eq!(consignee.document_id, document_id(bytes));
    assert_eq!(consignee.document_id.len(), 64);
}

#[test]
fn test_regions_serialize_with_flat_keys() {
    let layout = DocumentLayout::from_analyze_result(&analyze_result(), "doc");
    let extracted = json!({"BOLNumber": {"value": "77", "form_key": []}});

    let regions = locate_fields(&extracted, catalog().fields("bol").unwrap(), &layout);
    let value = serde_json::to_value(&regions).unwrap();

    assert_eq!(value[0]["template_field"], "BOLNumber");
    assert_eq!(value[0]["field_name"], "BOLNumber");
    assert_eq!(value[0]["top_left_y"], 0.8);
    assert_eq!(value[0]["document_id"], "doc");
}
