// End-to-end tests for the cloudspeak control API
//
// Each test gets its own temporary directory holding the sqlite quota database
// and the settings file, a fake synthesis backend served by axum on a random
// port, and the real router bound to another random port. Audio goes to the
// simulated output, so playback runs on the tokio clock without a sound card.

mod helpers;
mod test_health;
mod test_quota;
mod test_settings;
mod test_voices;
