pub mod google_tts_repository;
pub mod quota_repository;
pub mod settings_repository;
pub mod synthesis_backend;

pub use google_tts_repository::GoogleTtsRepository;
pub use quota_repository::{InMemoryQuotaMeter, QuotaMeter, SqliteQuotaMeter};
pub use settings_repository::{ConfigStore, FileConfigStore, InMemoryConfigStore, SettingsListener};
pub use synthesis_backend::SynthesisBackend;
