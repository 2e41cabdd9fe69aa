pub mod app_config;
pub mod azure;
pub mod env;
pub mod pipeline;
pub mod sources;
pub mod validation;

pub use app_config::*;
pub use azure::*;
pub use pipeline::*;
pub use sources::*;
pub use validation::*;
