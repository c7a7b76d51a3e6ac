pub mod google;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use google::GoogleProvider;
pub use traits::{GenerateRequest, GenerateResponse, TextGenerator, Usage};
pub use util::resolve_api_key;
