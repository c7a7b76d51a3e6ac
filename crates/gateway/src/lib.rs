pub mod bootstrap;
pub mod cli;
pub mod crm;
pub mod features;
pub mod intelligence;

pub use features::CrmAssistant;
pub use intelligence::{IntelligenceCall, IntelligenceGateway};
