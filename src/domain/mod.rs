pub mod playback;
pub mod quota;
pub mod settings;
pub mod synthesis;
