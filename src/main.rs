//! `captchad` - HTTP service serving image CAPTCHA challenges.
//!
//! Copyright (C) 2026 Maverick
//! SPDX-License-Identifier: AGPL-3.0-only
//!
//! Loads configuration, sets up logging, loads fonts and starts the HTTP listener.

use captchad::{ChallengeGenerator, Config, serve};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let generator = Arc::new(ChallengeGenerator::from_config(&config));
    if let Err(e) = generator.initialise(&config.font_dir, &config.charset) {
        error!(error = %e, font_dir = %config.font_dir.display(), "Captcha initialisation failed");
        std::process::exit(1);
    }

    info!(
        listen_addr = %config.listen_addr,
        font_dir = %config.font_dir.display(),
        render_timeout_ms = u64::try_from(config.render_timeout.as_millis()).unwrap_or(u64::MAX),
        concurrency_limit = config.concurrency_limit,
        log_format = %config.log_format,
        "Server initialized"
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create tokio runtime");
            std::process::exit(1);
        }
    };

    rt.block_on(async move {
        let listener = match TcpListener::bind(config.listen_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, listen_addr = %config.listen_addr, "Failed to bind");
                std::process::exit(1);
            }
        };
        serve(listener, generator, config.concurrency_limit).await;
    });
}
