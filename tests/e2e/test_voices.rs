use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use serde_json::{json, Value};
use test_context::test_context;

fn voice_names(body: &Value) -> Vec<String> {
    body["voices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap().to_string())
        .collect()
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_voices_sorted_by_name(ctx: &TestContext) {
    let response = ctx.client.get("/api/voices").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(
        voice_names(body),
        vec![
            "de-DE-Neural2-F",
            "en-US-Standard-C",
            "en-US-Wavenet-A",
            "fr-FR-Wavenet-B"
        ]
    );
    assert_eq!(body["languages"], json!(["de", "en", "fr"]));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_filter_by_language_model_and_gender(ctx: &TestContext) {
    let response = ctx
        .client
        .get("/api/voices?lang=en,fr&model=wavenet")
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(
        voice_names(response.body.as_ref().unwrap()),
        vec!["en-US-Wavenet-A", "fr-FR-Wavenet-B"]
    );

    let response = ctx.client.get("/api/voices?gender=female").await.unwrap();
    assert_eq!(
        voice_names(response.body.as_ref().unwrap()),
        vec!["de-DE-Neural2-F", "en-US-Standard-C"]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_cache_catalog_until_refresh(ctx: &TestContext) {
    ctx.client.get("/api/voices").await.unwrap();
    ctx.client.get("/api/voices?lang=en").await.unwrap();
    assert_eq!(ctx.google.voice_calls(), 1);

    ctx.client
        .get("/api/voices?refresh=true")
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    assert_eq!(ctx.google.voice_calls(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refetch_after_api_key_change(ctx: &TestContext) {
    ctx.client.get("/api/voices").await.unwrap();

    ctx.client
        .put("/api/settings/api-key", &json!({ "api_key": "not-a-valid-key" }))
        .await
        .unwrap()
        .assert_status(StatusCode::NO_CONTENT);

    let response = ctx.client.get("/api/voices").await.unwrap();
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("API key not valid");
}

#[tokio::test]
async fn it_should_require_an_api_key() {
    let ctx = TestContext::with_api_key(None).await.unwrap();

    let response = ctx.client.get("/api/voices").await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("API key not set");
    assert_eq!(ctx.google.voice_calls(), 0);
}
