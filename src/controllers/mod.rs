pub mod health;
pub mod playback;
pub mod quota;
pub mod settings;
pub mod voices;
