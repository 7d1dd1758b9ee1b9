//! HTTP listener.
//!
//! Accepts TCP connections and serves each one over HTTP/1 on its own task.

use crate::captcha::ChallengeGenerator;
use crate::service::router;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// Serves challenges on `listener` until the process exits.
///
/// At most `concurrency_limit` connections are handled at once.
pub async fn serve(
    listener: TcpListener,
    generator: Arc<ChallengeGenerator>,
    concurrency_limit: usize,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(listen_addr = %addr, "Captcha listener started");
    }

    let connection_limit = Arc::new(Semaphore::new(concurrency_limit.max(1)));

    loop {
        let Ok(permit) = Arc::clone(&connection_limit).acquire_owned().await else {
            break;
        };

        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let generator = Arc::clone(&generator);
                tokio::spawn(async move {
                    let _permit = permit;
                    let service = service_fn(move |req| {
                        let generator = Arc::clone(&generator);
                        async move { Ok::<_, Infallible>(router::handle(req, generator).await) }
                    });
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!(peer_addr = %peer_addr, error = %e, "Connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "Accept error");
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }
}
