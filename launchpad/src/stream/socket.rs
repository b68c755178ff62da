//! WebSocket transport for the shared log stream

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http::header::{HeaderValue, USER_AGENT};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::LaunchpadError;
use crate::stream::connection::ConnectionManager;
use crate::stream::payload::ClientFrame;
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Stream worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Streaming endpoint
    pub url: String,

    /// Reconnect backoff
    pub reconnect: CooldownOptions,

    /// Heartbeat interval
    pub heartbeat_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url: "ws://localhost:9002".to_string(),
            reconnect: CooldownOptions::default(),
            heartbeat_interval: Duration::from_secs(25),
        }
    }
}

/// Shortest heartbeat period and reconnect delay the worker accepts
const MIN_INTERVAL: Duration = Duration::from_secs(1);

impl Options {
    /// Heartbeat period, never zero
    pub fn heartbeat_period(&self) -> Duration {
        self.heartbeat_interval.max(MIN_INTERVAL)
    }

    /// Delay before the next connection attempt after `err_streak` failures
    pub fn reconnect_delay(&self, err_streak: u32) -> Duration {
        calc_exp_backoff(&self.reconnect, err_streak).max(MIN_INTERVAL)
    }
}

/// Keep the shared connection open until shutdown
pub async fn run(
    options: &Options,
    connection: Arc<ConnectionManager>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Stream worker starting...");

    let stream_url = match build_stream_url(&options.url) {
        Ok(url) => url,
        Err(e) => {
            error!("Failed to build stream URL: {}", e);
            return;
        }
    };

    if options.heartbeat_interval < MIN_INTERVAL {
        warn!(
            "Heartbeat interval {:?} is too short, using {:?}",
            options.heartbeat_interval, MIN_INTERVAL
        );
    }

    let mut err_streak: u32 = 0;

    loop {
        info!("Connecting to log stream: {}", stream_url);

        let mut request = match stream_url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => {
                error!("Invalid stream request: {}", e);
                return;
            }
        };
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static("Launchpad"));

        let connected = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Stream worker shutting down...");
                return;
            }
            result = connect_async(request) => result,
        };

        match connected {
            Ok((mut ws_stream, _)) => {
                info!("Connected to log stream");
                err_streak = 0;

                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientFrame>();
                connection.on_connected(outbound_tx);

                let mut heartbeat_tick = tokio::time::interval(options.heartbeat_period());
                heartbeat_tick.tick().await;

                loop {
                    tokio::select! {
                        _ = &mut shutdown_signal => {
                            info!("Stream worker closing connection...");
                            connection.on_disconnected();
                            let _ = ws_stream.close(None).await;
                            return;
                        }
                        _ = heartbeat_tick.tick() => {
                            if let Err(e) = send_frame(&mut ws_stream, &ClientFrame::Ping).await {
                                warn!("Failed to send heartbeat: {}", e);
                                break;
                            }
                        }
                        Some(frame) = outbound_rx.recv() => {
                            if let Err(e) = send_frame(&mut ws_stream, &frame).await {
                                warn!("Failed to send {:?}: {}", frame, e);
                                break;
                            }
                        }
                        msg = ws_stream.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    connection.dispatch(text.as_str());
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    warn!("Log stream closed connection");
                                    break;
                                }
                                Some(Err(e)) => {
                                    error!("Log stream error: {}", e);
                                    break;
                                }
                                Some(Ok(other)) => {
                                    debug!("Ignoring non-text frame: {:?}", other);
                                }
                            }
                        }
                    }
                }

                connection.on_disconnected();
            }
            Err(e) => {
                err_streak += 1;
                error!("Failed to connect to log stream: {}", e);
            }
        }

        let delay = options.reconnect_delay(err_streak);
        info!("Reconnecting to log stream in {:?}...", delay);
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Stream worker shutting down...");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn send_frame<S>(ws_stream: &mut S, frame: &ClientFrame) -> Result<(), LaunchpadError>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let text = frame.to_text()?;
    ws_stream
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| LaunchpadError::StreamError(e.to_string()))
}

/// Normalize the configured endpoint to a ws/wss URL
pub fn build_stream_url(base_url: &str) -> Result<Url, LaunchpadError> {
    let mut url = Url::parse(base_url).map_err(|e| LaunchpadError::ConfigError(e.to_string()))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => {
            return Err(LaunchpadError::ConfigError(format!(
                "Invalid stream URL scheme: {}",
                other
            )))
        }
    };

    url.set_scheme(scheme)
        .map_err(|_| LaunchpadError::ConfigError("Failed to set scheme".to_string()))?;

    Ok(url)
}
