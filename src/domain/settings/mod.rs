pub mod dto;
pub mod error;
pub mod model;

pub use dto::{SetApiKeyRequest, SettingsResponse, UpdateSettingsRequest};
pub use error::SettingsError;
pub use model::{api_key_fingerprint, UserSettings};
