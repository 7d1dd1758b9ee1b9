#![allow(dead_code)]

use captchad::{ChallengeGenerator, Layout, serve};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const CHARSET: &str = "ABCDEFHKLMNPQRTUVWXYabcdefhkmnpqrtuvwxy";

pub fn fixture_font_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

pub fn initialised_generator() -> Arc<ChallengeGenerator> {
    let generator = ChallengeGenerator::new(Layout::default(), Duration::from_secs(10));
    generator
        .initialise(&fixture_font_dir(), CHARSET)
        .expect("fixture fonts should load");
    Arc::new(generator)
}

pub async fn spawn_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(serve(listener, initialised_generator(), 16));
    port
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
