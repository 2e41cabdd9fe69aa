pub mod extract;
pub mod root;

pub use extract::{extract_information, ExtractResponse};
pub use root::{not_found, root};
