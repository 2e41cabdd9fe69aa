use crate::chat::{ChatMessage, ChatModel, ChatRequest};
use crate::error::ExtractError;
use crate::prompt::{form_type_prompt, FORM_TYPE_SYSTEM_PROMPT};
use std::sync::Arc;

/// Returned when the document type cannot be determined
pub const UNKNOWN_FORM_TYPE: &str = "Unknown";

const FORM_TYPE_MAX_TOKENS: u32 = 50;

/// Classifies a document ("Bill of Lading", "Invoice", ...) from its OCR text
#[derive(Clone)]
pub struct FormTypeService {
    chat: Arc<dyn ChatModel>,
}

impl FormTypeService {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    pub async fn identify_form_type(&self, ocr_text: &str) -> Result<String, ExtractError> {
        if ocr_text.is_empty() {
            return Ok(UNKNOWN_FORM_TYPE.to_string());
        }

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(FORM_TYPE_SYSTEM_PROMPT),
                ChatMessage::user(form_type_prompt(ocr_text)?),
            ],
            FORM_TYPE_MAX_TOKENS,
        );

        let form_type = self
            .chat
            .complete(request)
            .await?
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| UNKNOWN_FORM_TYPE.to_string());

        tracing::info!(form_type = %form_type, "Identified form type");
        Ok(form_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let chat = Arc::new(ScriptedChat::new(vec![]));
        let service = FormTypeService::new(chat.clone());

        assert_eq!(service.identify_form_type("").await.unwrap(), "Unknown");
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn test_trims_model_answer() {
        let chat = Arc::new(ScriptedChat::new(vec![Some("  Bill of Lading\n".to_string())]));
        let service = FormTypeService::new(chat.clone());

        let form_type = service.identify_form_type("BILL OF LADING\nShipper").await.unwrap();
        assert_eq!(form_type, "Bill of Lading");

        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 50);
        assert_eq!(
            requests[0].messages[0],
            ChatMessage::system("You are an expert in document analysis.")
        );
    }

    #[tokio::test]
    async fn test_blank_answer_is_unknown() {
        let chat = Arc::new(ScriptedChat::new(vec![Some("   ".to_string())]));
        let service = FormTypeService::new(chat);
        assert_eq!(service.identify_form_type("text").await.unwrap(), "Unknown");

        let chat = Arc::new(ScriptedChat::new(vec![None]));
        let service = FormTypeService::new(chat);
        assert_eq!(service.identify_form_type("text").await.unwrap(), "Unknown");
    }
}
