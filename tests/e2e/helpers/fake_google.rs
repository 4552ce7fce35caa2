use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cloudspeak::domain::synthesis::SynthesizeRequest;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const TEST_API_KEY: &str = "test-api-key";

const SAMPLE_RATE: u32 = 8000;

#[derive(Default)]
struct Recorded {
    requests: Vec<SynthesizeRequest>,
    voice_calls: usize,
    fail_on: Option<String>,
    clip: Duration,
}

#[derive(Clone)]
struct FakeState {
    recorded: Arc<Mutex<Recorded>>,
}

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

/// Stand-in for the Google Text-to-Speech REST API
pub struct FakeGoogle {
    pub base_url: String,
    state: FakeState,
}

impl FakeGoogle {
    pub async fn start() -> Result<Self> {
        let state = FakeState {
            recorded: Arc::new(Mutex::new(Recorded {
                clip: Duration::from_millis(200),
                ..Default::default()
            })),
        };

        let app = Router::new()
            .route("/v1beta1/text:synthesize", post(synthesize))
            .route("/v1beta1/voices", get(voices))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { base_url, state })
    }

    /// Length of the WAV clip returned for every segment
    pub fn set_clip_duration(&self, clip: Duration) {
        self.state.recorded.lock().clip = clip;
    }

    /// Answer with a backend error for any segment containing `needle`
    pub fn fail_when_text_contains(&self, needle: &str) {
        self.state.recorded.lock().fail_on = Some(needle.to_string());
    }

    /// Segment texts received so far, in order
    pub fn texts(&self) -> Vec<String> {
        self.state
            .recorded
            .lock()
            .requests
            .iter()
            .map(|r| r.input.text.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<SynthesizeRequest> {
        self.state.recorded.lock().requests.clone()
    }

    pub fn voice_calls(&self) -> usize {
        self.state.recorded.lock().voice_calls
    }
}

fn invalid_key() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": {
                "code": 403,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "PERMISSION_DENIED"
            }
        })),
    )
        .into_response()
}

/// Silent mono 16-bit WAV of the given length
pub fn wav_clip(duration: Duration) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let samples = (duration.as_secs_f64() * SAMPLE_RATE as f64) as usize;

    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    bytes
}

async fn synthesize(
    State(state): State<FakeState>,
    Query(query): Query<KeyQuery>,
    Json(request): Json<SynthesizeRequest>,
) -> Response {
    if query.key.as_deref() != Some(TEST_API_KEY) {
        return invalid_key();
    }

    let (fail, clip) = {
        let mut recorded = state.recorded.lock();
        recorded.requests.push(request.clone());
        let fail = recorded
            .fail_on
            .as_deref()
            .is_some_and(|needle| request.input.text.contains(needle));
        (fail, recorded.clip)
    };

    if fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": {
                    "code": 500,
                    "message": "Synthesis backend exploded",
                    "status": "INTERNAL"
                }
            })),
        )
            .into_response();
    }

    Json(json!({ "audioContent": STANDARD.encode(wav_clip(clip)) })).into_response()
}

async fn voices(State(state): State<FakeState>, Query(query): Query<KeyQuery>) -> Response {
    if query.key.as_deref() != Some(TEST_API_KEY) {
        return invalid_key();
    }
    state.recorded.lock().voice_calls += 1;

    Json(json!({
        "voices": [
            {"languageCodes": ["en-US"], "name": "en-US-Wavenet-A", "ssmlGender": "MALE", "naturalSampleRateHertz": 24000},
            {"languageCodes": ["en-US"], "name": "en-US-Standard-C", "ssmlGender": "FEMALE", "naturalSampleRateHertz": 24000},
            {"languageCodes": ["fr-FR"], "name": "fr-FR-Wavenet-B", "ssmlGender": "MALE", "naturalSampleRateHertz": 24000},
            {"languageCodes": ["de-DE"], "name": "de-DE-Neural2-F", "ssmlGender": "FEMALE", "naturalSampleRateHertz": 24000}
        ]
    }))
    .into_response()
}
