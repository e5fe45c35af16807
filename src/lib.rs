pub mod api;
pub mod corpus;
pub mod error;
pub mod hotkey;
pub mod markdown;
pub mod popup;
pub mod search;
pub mod unlink;

// Convenience re-exports
pub use api::client::RoamClient;
pub use api::queries;
pub use api::types;
pub use error::{Result, RoamError};
