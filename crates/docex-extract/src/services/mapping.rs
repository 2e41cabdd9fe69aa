use super::EXTRACTION_MAX_TOKENS;
use crate::chat::{ChatMessage, ChatModel, ChatRequest, ContentPart};
use crate::error::ExtractError;
use crate::mapping::FieldSpec;
use crate::prompt::{mapping_prompt, shipping_system_prompt};
use serde_json::{json, Value};
use std::sync::Arc;

/// Maps the document knowledge base onto a field catalog
#[derive(Clone)]
pub struct MappingService {
    chat: Arc<dyn ChatModel>,
    fields: Vec<FieldSpec>,
}

impl MappingService {
    pub fn new(chat: Arc<dyn ChatModel>, fields: Vec<FieldSpec>) -> Self {
        Self { chat, fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns `{"chunk": <parsed model JSON>}`.
    pub async fn final_mapping(
        &self,
        knowledge_base: &str,
        form_type: &str,
        images: &[String],
    ) -> Result<Value, ExtractError> {
        let mut parts = vec![ContentPart::text(mapping_prompt(
            form_type,
            &self.fields,
            knowledge_base,
        )?)];
        parts.extend(images.iter().map(|image| ContentPart::jpeg(image)));

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(shipping_system_prompt(form_type)),
                ChatMessage::user_parts(parts),
            ],
            EXTRACTION_MAX_TOKENS,
        );

        let content = self.chat.complete(request).await?;
        Ok(postprocess_mapping(content.as_deref()))
    }
}

fn strip_json_fence(content: &str) -> &str {
    match content.strip_prefix("```json") {
        Some(inner) => {
            let inner = inner.trim_end();
            inner.strip_suffix("```").unwrap_or(inner)
        }
        None => content,
    }
}

/// Parses the mapping answer, falling back to an empty field set.
pub fn postprocess_mapping(content: Option<&str>) -> Value {
    let parsed = content
        .map(strip_json_fence)
        .map(|body| serde_json::from_str::<Value>(body));

    match parsed {
        Some(Ok(chunk)) => json!({ "chunk": chunk }),
        Some(Err(e)) => {
            tracing::error!(error = %e, "Failed to parse JSON from model output");
            json!({ "chunk": { "extracted_fields": {} } })
        }
        None => {
            tracing::error!("Model returned no content for the field mapping");
            json!({ "chunk": { "extracted_fields": {} } })
        }
    }
}
