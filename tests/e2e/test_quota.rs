use crate::e2e::helpers;

use helpers::{paragraphs, TestContext};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_start_with_empty_counters(ctx: &TestContext) {
    let response = ctx.client.get("/api/quota").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["char_count_std"], json!(0));
    assert_eq!(body["char_count_wave"], json!(0));
    assert_eq!(body["limit_wave"], json!(1_000_000));
    assert_eq!(body["limit_std"], json!(4_000_000));
    assert!(body["warning_wave"].is_null());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_bill_characters_sent_to_backend(ctx: &TestContext) {
    let text = paragraphs(2);

    ctx.client
        .post("/api/speak", &json!({ "text": text }))
        .await
        .unwrap();
    ctx.wait_until("both segments played", |ctx| ctx.output.starts().len() == 2)
        .await;
    ctx.wait_for_state("STOPPED").await;

    let billed: usize = ctx.google.texts().iter().map(|t| t.chars().count()).sum();
    let response = ctx.client.get("/api/quota").await.unwrap();
    let body = response.body.as_ref().unwrap();

    // The default voice is a WaveNet voice
    assert_eq!(body["char_count_wave"], json!(billed));
    assert_eq!(body["char_count_std"], json!(0));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_bill_replays(ctx: &TestContext) {
    ctx.client
        .post("/api/speak", &json!({ "text": "Hello there" }))
        .await
        .unwrap();
    ctx.wait_until("first run played", |ctx| ctx.output.starts().len() == 1)
        .await;
    ctx.wait_for_state("STOPPED").await;

    ctx.client.post_empty("/api/play").await.unwrap();
    ctx.wait_until("replay played", |ctx| ctx.output.starts().len() == 2)
        .await;

    let response = ctx.client.get("/api/quota").await.unwrap();
    assert_eq!(
        response.body.as_ref().unwrap()["char_count_wave"],
        json!("Hello there".len())
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reset_counters(ctx: &TestContext) {
    ctx.client
        .post("/api/speak", &json!({ "text": "Hello there" }))
        .await
        .unwrap();
    ctx.wait_for_state("STOPPED").await;

    let response = ctx.client.post_empty("/api/quota/reset").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["char_count_wave"], json!(0));
    assert!(body["last_reset"].is_string());
}
