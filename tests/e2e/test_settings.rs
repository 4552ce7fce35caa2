use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_settings_without_the_api_key(ctx: &TestContext) {
    let response = ctx.client.get("/api/settings").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["api_key_set"], json!(true));
    assert_eq!(body["voice"]["voice_name"], json!("en-US-Wavenet-A"));
    assert_eq!(body["voice"]["audio_encoding"], json!("LINEAR16"));
    assert!(body["install_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(!response
        .body_bytes
        .windows(helpers::fake_google::TEST_API_KEY.len())
        .any(|w| w == helpers::fake_google::TEST_API_KEY.as_bytes()));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_update_provided_fields_only(ctx: &TestContext) {
    let response = ctx
        .client
        .put(
            "/api/settings",
            &json!({ "voice_name": "fr-FR-Wavenet-B", "speaking_rate": 1.5 }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["voice"]["voice_name"], json!("fr-FR-Wavenet-B"));
    assert_eq!(body["voice"]["language_code"], json!("fr-FR"));
    assert_eq!(body["voice"]["speaking_rate"], json!(1.5));
    assert_eq!(body["voice"]["audio_encoding"], json!("LINEAR16"));

    let stored = ctx.config_store.load().await.unwrap();
    assert_eq!(stored.voice.voice_name, "fr-FR-Wavenet-B");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_settings(ctx: &TestContext) {
    let response = ctx
        .client
        .put("/api/settings", &json!({ "pitch": 42.0 }))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("pitch must be between");

    let response = ctx
        .client
        .put("/api/settings", &json!({ "voice_name": "robot" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_use_new_voice_for_next_speak(ctx: &TestContext) {
    ctx.client
        .put("/api/settings", &json!({ "voice_name": "de-DE-Standard-B" }))
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    ctx.client
        .post("/api/speak", &json!({ "text": "Guten Tag" }))
        .await
        .unwrap();
    ctx.wait_until("segment fetched", |ctx| !ctx.google.requests().is_empty())
        .await;

    let request = &ctx.google.requests()[0];
    assert_eq!(request.voice.name, "de-DE-Standard-B");
    assert_eq!(request.voice.language_code, "de-DE");
}

#[tokio::test]
async fn it_should_store_a_new_api_key() {
    let ctx = TestContext::with_api_key(None).await.unwrap();

    let response = ctx.client.get("/api/settings").await.unwrap();
    assert_eq!(response.body.as_ref().unwrap()["api_key_set"], json!(false));

    ctx.client
        .put("/api/settings/api-key", &json!({ "api_key": "  " }))
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.client
        .put(
            "/api/settings/api-key",
            &json!({ "api_key": helpers::fake_google::TEST_API_KEY }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::NO_CONTENT);

    let response = ctx.client.get("/api/settings").await.unwrap();
    assert_eq!(response.body.as_ref().unwrap()["api_key_set"], json!(true));
}
