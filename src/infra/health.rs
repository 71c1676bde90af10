//! HTTP implementation of the `HealthProbe` port.
//!
//! Polls `GET <base>/health` at a fixed interval until the agent answers
//! with a success status. Network errors mean "not ready yet" — only the
//! timeout or the process dying end the wait.

use std::time::Duration;

use reqwest::Client;

use crate::application::ports::{AgentProcess, HealthProbe};

/// Fixed delay between liveness requests.
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(150);

/// Per-request bound so a single hung request cannot eat the whole wait.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Production `HealthProbe` using reqwest.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: Client,
    poll_interval: Duration,
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self {
            client: Client::new(),
            poll_interval: HEALTH_POLL_INTERVAL,
        }
    }
}

impl HttpHealthProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the poll interval (used in tests).
    #[must_use]
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            poll_interval,
        }
    }
}

impl HealthProbe for HttpHealthProbe {
    async fn wait_healthy(
        &self,
        base_address: &str,
        process: &AgentProcess,
        timeout: Duration,
    ) -> bool {
        let url = format!("{base_address}/health");
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // A dead process will never answer; waiting is pointless.
            if process.has_exited() {
                return false;
            }
            match self.client.get(&url).timeout(REQUEST_TIMEOUT).send().await {
                Ok(response) if response.status().is_success() => return true,
                // Refused, reset, timed out, 5xx: not ready yet.
                _ => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::watch;

    use super::*;

    fn live_handle() -> (watch::Sender<bool>, AgentProcess) {
        let (tx, rx) = watch::channel(false);
        (tx, AgentProcess::new(123, rx))
    }

    /// Minimal HTTP responder answering every request with `status`.
    async fn serve(listener: TcpListener, status: &'static str) {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0_u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response =
                    format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    }

    #[tokio::test]
    async fn healthy_endpoint_reports_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(serve(listener, "200 OK"));

        let (_tx, process) = live_handle();
        let probe = HttpHealthProbe::with_poll_interval(Duration::from_millis(20));
        assert!(
            probe
                .wait_healthy(&format!("http://{addr}"), &process, Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test]
    async fn error_responses_are_not_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(serve(listener, "500 Internal Server Error"));

        let (_tx, process) = live_handle();
        let probe = HttpHealthProbe::with_poll_interval(Duration::from_millis(20));
        assert!(
            !probe
                .wait_healthy(
                    &format!("http://{addr}"),
                    &process,
                    Duration::from_millis(200)
                )
                .await
        );
    }

    #[tokio::test]
    async fn connection_refused_times_out_as_not_ready() {
        // Grab a free port and release it so nothing is listening there.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (_tx, process) = live_handle();
        let probe = HttpHealthProbe::with_poll_interval(Duration::from_millis(20));
        assert!(
            !probe
                .wait_healthy(
                    &format!("http://{addr}"),
                    &process,
                    Duration::from_millis(200)
                )
                .await
        );
    }

    #[tokio::test]
    async fn dead_process_aborts_the_wait() {
        let (tx, process) = live_handle();
        tx.send(true).expect("mark exited");

        let probe = HttpHealthProbe::with_poll_interval(Duration::from_millis(20));
        let started = std::time::Instant::now();
        assert!(
            !probe
                .wait_healthy("http://127.0.0.1:9", &process, Duration::from_secs(30))
                .await
        );
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "abort should not wait out the timeout"
        );
    }
}
