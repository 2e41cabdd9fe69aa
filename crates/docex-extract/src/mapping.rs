//! Field catalogs the final mapping step extracts into.

use crate::error::ExtractError;
use docex_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Catalog used when none is configured
pub const DEFAULT_MAPPING: &str = "dock_management";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Number,
    Checkbox,
}

/// One field the model is asked to fill in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "FormField")]
    pub form_field: String,
    #[serde(rename = "JSONTag")]
    pub json_tag: String,
    #[serde(rename = "DataType")]
    pub data_type: DataType,
    #[serde(rename = "Notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "SourcePage", default = "first_page")]
    pub source_page: u32,
}

fn first_page() -> u32 {
    1
}

impl FieldSpec {
    fn builtin(form_field: &str, json_tag: &str, data_type: DataType, notes: &str) -> Self {
        Self {
            form_field: form_field.to_string(),
            json_tag: json_tag.to_string(),
            data_type,
            notes: Some(notes.to_string()),
            source_page: 1,
        }
    }
}

/// Named lists of fields, in the order they are prompted and located
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingCatalog {
    mappings: BTreeMap<String, Vec<FieldSpec>>,
}

impl Default for MappingCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MappingCatalog {
    pub fn builtin() -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert(DEFAULT_MAPPING.to_string(), dock_management());
        Self { mappings }
    }

    /// Parse a catalog from JSON shaped as `{"<name>": [field, ...]}`.
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            mappings = catalog.mappings.len(),
            "Loaded field mapping catalog"
        );
        Ok(catalog)
    }

    /// The configured catalog file, or the builtin catalogs when none is set.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ExtractError> {
        match &config.mapping_file {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn fields(&self, name: &str) -> Result<&[FieldSpec], ExtractError> {
        self.mappings
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ExtractError::unknown_mapping(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<(), ExtractError> {
        if self.mappings.is_empty() {
            return Err(ExtractError::catalog("catalog defines no mappings"));
        }
        for (name, fields) in &self.mappings {
            if fields.is_empty() {
                return Err(ExtractError::catalog(format!(
                    "mapping '{}' has no fields",
                    name
                )));
            }
            if let Some(field) = fields.iter().find(|f| f.json_tag.trim().is_empty()) {
                return Err(ExtractError::catalog(format!(
                    "mapping '{}' has a field without a JSON tag ('{}')",
                    name, field.form_field
                )));
            }
        }
        Ok(())
    }
}

/// Field list as presented in the mapping prompt, one line per field.
pub fn fields_prompt(fields: &[FieldSpec]) -> String {
    let mut prompt = String::new();
    for field in fields {
        prompt.push_str(&format!(
            "- Form Field: '{}' -> JSON Tag: '{}'",
            field.form_field, field.json_tag
        ));
        if let Some(notes) = field.notes.as_deref().filter(|n| !n.is_empty()) {
            prompt.push_str(&format!(" (Notes: {})", notes));
        }
        prompt.push('\n');
    }
    prompt
}

/// JSON tags rendered as a bracketed, single quoted list
pub fn tags_literal(fields: &[FieldSpec]) -> String {
    let tags: Vec<String> = fields
        .iter()
        .map(|field| format!("'{}'", field.json_tag))
        .collect();
    format!("[{}]", tags.join(", "))
}

fn dock_management() -> Vec<FieldSpec> {
    use DataType::{Checkbox, Number, Text};

    let checkbox_note =
        "Return {'selected': True} if checked, {'selected': False} if unchecked.";

    vec![
        FieldSpec::builtin(
            "Origin - Company Name",
            "OriginCompany",
            Text,
            "Extract only the company name (e.g., 'Tesla Inc'). Avoid merging with address.",
        ),
        FieldSpec::builtin(
            "Origin - Address",
            "OriginAddress",
            Text,
            "Full street, city, state, ZIP, and country in one string (e.g., '6563 Headquarters Dr, Plano, TX 75024, USA').",
        ),
        FieldSpec::builtin(
            "Origin - Phone",
            "OriginPhone",
            Text,
            "Format like '+1 (555) 123-4567'. Ignore any phone icons.",
        ),
        FieldSpec::builtin(
            "Origin - Email",
            "OriginEmail",
            Text,
            "Extract the plain email address without icons (e.g., 'support@example.com').",
        ),
        FieldSpec::builtin(
            "Destination - Company Name",
            "DestinationCompany",
            Text,
            "Only the company name (e.g., 'EAGLE Manufacturer ltd').",
        ),
        FieldSpec::builtin(
            "Destination - Address",
            "DestinationAddress",
            Text,
            "Full street, city, state, ZIP, and country in one string.",
        ),
        FieldSpec::builtin(
            "Destination - Phone",
            "DestinationPhone",
            Text,
            "Same formatting as OriginPhone (e.g., '+1 (555) 123-4567').",
        ),
        FieldSpec::builtin(
            "Destination - Email",
            "DestinationEmail",
            Text,
            "Plain email value only (e.g., 'support@example.com').",
        ),
        FieldSpec::builtin(
            "Handling Unit Type",
            "HandlingUnitType",
            Text,
            "Dropdown value like 'Pallet', 'Crate', etc.",
        ),
        FieldSpec::builtin(
            "Quantity",
            "Quantity",
            Number,
            "Numeric only (e.g., 3). No units or symbols.",
        ),
        FieldSpec::builtin(
            "Weight Unit",
            "WeightUnit",
            Text,
            "Dropdown text value (e.g., 'Lbs').",
        ),
        FieldSpec::builtin(
            "Weight Value",
            "Weight",
            Number,
            "Numeric only (e.g., 3200). No commas or unit suffix.",
        ),
        FieldSpec::builtin(
            "BOL No",
            "BOLNumber",
            Text,
            "Capture as-is (e.g., '123456588'). Can be numeric or alphanumeric.",
        ),
        FieldSpec::builtin(
            "Carrier Pro No",
            "CarrierProNumber",
            Text,
            "Capture raw text (e.g., '123345854').",
        ),
        FieldSpec::builtin(
            "Customer Ref. ID",
            "CustomerReferenceID",
            Text,
            "Capture as-is (e.g., '5754122254').",
        ),
        FieldSpec::builtin(
            "NMFC",
            "NMFC",
            Text,
            "Typically numeric or short text code (e.g., '150'). Treat as text.",
        ),
        FieldSpec::builtin(
            "No NMFC Class on BOL",
            "NoNMFCClassOnBOL",
            Checkbox,
            checkbox_note,
        ),
        FieldSpec::builtin("In Bond", "InBond", Checkbox, checkbox_note),
        FieldSpec::builtin("Hazmat", "Hazmat", Checkbox, checkbox_note),
        FieldSpec::builtin(
            "Order ID",
            "OrderID",
            Text,
            "E.g., 1539964. Numeric text\u{2014}no prefix.",
        ),
        FieldSpec::builtin(
            "Shipment ID",
            "ShipmentID",
            Text,
            "Starts with 'S' consistently (e.g., 'S1539964'). Always capture the full alphanumeric.",
        ),
        FieldSpec::builtin(
            "Transport ID",
            "TransportID",
            Text,
            "Starts with 'T' (e.g., 'T1254247'). Do not strip the letter. Capture the full alphanumeric.",
        ),
    ]
}
