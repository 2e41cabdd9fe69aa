use anyhow::{Context, Result};
use console::style;
use docex_extract::{DataType, FieldSpec, MappingCatalog};
use std::path::Path;

pub fn run(mapping: Option<&Path>, name: &str) -> Result<()> {
    let catalog = match mapping {
        Some(path) => MappingCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => MappingCatalog::builtin(),
    };

    let fields = catalog.fields(name).with_context(|| {
        let names: Vec<&str> = catalog.names().collect();
        format!("Available mappings: {}", names.join(", "))
    })?;

    println!("{} {} ({} fields)", style("📋").bold(), style(name).bold().cyan(), fields.len());
    for field in fields {
        println!("{}", describe(field));
    }
    Ok(())
}

fn describe(field: &FieldSpec) -> String {
    let kind = match field.data_type {
        DataType::Text => "text",
        DataType::Number => "number",
        DataType::Checkbox => "checkbox",
    };
    let mut line = format!(
        "   {:<22} {:<30} {:<8}",
        field.json_tag, field.form_field, kind
    );
    if field.source_page != 1 {
        line.push_str(&format!(" page {}", field.source_page));
    }
    line.trim_end().to_string()
}
