mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{client, spawn_server};
use serde::Deserialize;

#[derive(Deserialize)]
struct ChallengeJson {
    text: String,
    base64: String,
}

async fn get(port: u16, path: &str) -> reqwest::Response {
    let client = client();
    for _ in 0..5 {
        if let Ok(resp) = client
            .get(format!("http://127.0.0.1:{port}{path}"))
            .send()
            .await
        {
            return resp;
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
    panic!("Failed to connect to captcha server");
}

#[tokio::test]
async fn test_png_challenge() {
    let port = spawn_server().await;
    let resp = get(port, "/").await;

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/png");
    let text = resp.headers()["x-captcha-text"]
        .to_str()
        .unwrap()
        .to_string();
    assert!((4..=6).contains(&text.len()));
    assert_eq!(text, text.to_lowercase());

    let body = resp.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (140, 40));
}

#[tokio::test]
async fn test_base64_challenge() {
    let port = spawn_server().await;
    let resp = get(port, "/?base64=true").await;

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("x-captcha-text").is_none());
    let body: ChallengeJson = resp.json().await.unwrap();
    assert!((4..=6).contains(&body.text.len()));

    let bytes = STANDARD.decode(body.base64).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (140, 40));
}

#[tokio::test]
async fn test_invalid_base64_flag_serves_png() {
    let port = spawn_server().await;
    let resp = get(port, "/?base64=yes").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let port = spawn_server().await;
    let resp = get(port, "/admin").await;
    assert_eq!(resp.status(), 404);
}
