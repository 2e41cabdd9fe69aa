use super::EXTRACTION_MAX_TOKENS;
use crate::chat::{ChatMessage, ChatModel, ChatRequest, ContentPart};
use crate::error::ExtractError;
use crate::prompt::{extraction_prompt, shipping_system_prompt};
use std::sync::Arc;

/// Extracts a hierarchical JSON knowledge base from a single page
#[derive(Clone)]
pub struct KnowledgeBaseService {
    chat: Arc<dyn ChatModel>,
}

impl KnowledgeBaseService {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Model output for one page; empty when the model returned nothing.
    ///
    /// `previous_summary` is the extraction of the page before, giving the
    /// model context for sections that continue across pages.
    pub async fn initial_extraction(
        &self,
        page_image_b64: &str,
        ocr_text: &str,
        previous_summary: Option<&str>,
        form_type: &str,
    ) -> Result<String, ExtractError> {
        let prompt = extraction_prompt(form_type, ocr_text, previous_summary)?;
        let request = ChatRequest::new(
            vec![
                ChatMessage::system(shipping_system_prompt(form_type)),
                ChatMessage::user_parts(vec![
                    ContentPart::text(prompt),
                    ContentPart::jpeg(page_image_b64),
                ]),
            ],
            EXTRACTION_MAX_TOKENS,
        );

        let content = self.chat.complete(request).await?.unwrap_or_default();
        tracing::debug!(chars = content.len(), "Page knowledge base extracted");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageContent;
    use crate::testing::ScriptedChat;

    #[tokio::test]
    async fn test_request_carries_prompt_and_page_image() {
        let chat = Arc::new(ScriptedChat::new(vec![Some("{\"page\": 2}".to_string())]));
        let service = KnowledgeBaseService::new(chat.clone());

        let content = service
            .initial_extraction("QUJD", "Consignee: Eagle", Some("{\"page\": 1}"), "Dock Receipt")
            .await
            .unwrap();
        assert_eq!(content, "{\"page\": 2}");

        let request = &chat.requests()[0];
        assert_eq!(request.max_tokens, 4000);
        assert_eq!(
            request.messages[0],
            ChatMessage::system(shipping_system_prompt("Dock Receipt"))
        );
        match &request.messages[1].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                match &parts[0] {
                    ContentPart::Text { text } => {
                        assert!(text.contains("Consignee: Eagle"));
                        assert!(text.ends_with("Previous Page Summary:\n{\"page\": 1}"));
                    }
                    other => panic!("expected text part, got {:?}", other),
                }
                assert_eq!(parts[1], ContentPart::jpeg("QUJD"));
            }
            other => panic!("expected multipart content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_content_is_empty() {
        let chat = Arc::new(ScriptedChat::new(vec![None]));
        let service = KnowledgeBaseService::new(chat);
        let content = service
            .initial_extraction("QUJD", "", None, "Unknown")
            .await
            .unwrap();
        assert!(content.is_empty());
    }
}
