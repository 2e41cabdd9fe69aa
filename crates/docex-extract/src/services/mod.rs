//! Model-backed steps of the extraction pipeline.

pub mod form_type;
pub mod knowledge_base;
pub mod mapping;

pub use form_type::FormTypeService;
pub use knowledge_base::KnowledgeBaseService;
pub use mapping::{postprocess_mapping, MappingService};

/// Completion budget for knowledge base and mapping calls
pub const EXTRACTION_MAX_TOKENS: u32 = 4000;
