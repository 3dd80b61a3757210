use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use log::debug;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::SourceConfig;
use crate::error::AppError;
use crate::fetch::{ChannelFactory, ChartEvent, FetchResult, Period, RemoteChannel, SeriesRequest};

use super::protocol::{encode_frame, encode_message, parse_frames, Packet};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SERIES_ID: &str = "ser_1";
const ERROR_METHODS: &[&str] = &["symbol_error", "series_error", "critical_error", "protocol_error"];

/// Upper bound for each teardown step.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opens one chart socket per channel against the configured endpoint.
#[derive(Debug, Clone)]
pub struct TradingViewFactory {
    source: SourceConfig,
}

impl TradingViewFactory {
    pub fn new(source: SourceConfig) -> Self {
        Self { source }
    }
}

impl ChannelFactory for TradingViewFactory {
    type Channel = TradingViewChannel;

    async fn open(&self, request: &SeriesRequest) -> FetchResult<TradingViewChannel> {
        let mut ws_request = self.source.endpoint.as_str().into_client_request()?;
        let origin = HeaderValue::from_str(&self.source.origin)
            .map_err(|err| AppError::message(format!("invalid origin header: {err}")))?;
        ws_request.headers_mut().insert(ORIGIN, origin);

        let (socket, _response) = connect_async(ws_request)
            .await
            .map_err(|err| AppError::channel_open(&request.market_key, err.to_string()))?;

        let mut channel = TradingViewChannel {
            socket,
            session: next_session_id(),
            description: None,
            pending: VecDeque::new(),
            closed: false,
        };

        if let Err(err) = channel.subscribe(request).await {
            channel.close().await;
            return Err(AppError::channel_open(&request.market_key, err.to_string()));
        }
        Ok(channel)
    }
}

/// One chart session on its own socket.
pub struct TradingViewChannel {
    socket: Socket,
    session: String,
    description: Option<String>,
    pending: VecDeque<ChartEvent>,
    closed: bool,
}

impl TradingViewChannel {
    async fn subscribe(&mut self, request: &SeriesRequest) -> FetchResult<()> {
        let symbol = format!(
            "={}",
            json!({ "symbol": request.market_key, "adjustment": "splits" })
        );
        let to = request.to.timestamp();

        self.send("set_auth_token", json!(["unauthorized_user_token"]))
            .await?;
        self.send("chart_create_session", json!([self.session, ""]))
            .await?;
        self.send(
            "resolve_symbol",
            json!([self.session, SERIES_ID, symbol]),
        )
        .await?;
        self.send(
            "create_series",
            json!([
                self.session,
                "$prices",
                "s1",
                SERIES_ID,
                request.timeframe,
                request.range,
                format!("bar_count,{},{}", to, request.range),
            ]),
        )
        .await
    }

    async fn send(&mut self, method: &str, params: Value) -> FetchResult<()> {
        self.socket
            .send(Message::Text(encode_message(method, params)))
            .await?;
        Ok(())
    }

    async fn handle_text(&mut self, text: &str) {
        for packet in parse_frames(text) {
            match packet {
                Packet::Heartbeat(beat) => {
                    if let Err(err) = self.socket.send(Message::Text(encode_frame(&beat))).await {
                        debug!("heartbeat echo failed for {}: {}", self.session, err);
                    }
                }
                Packet::Message { method, params } => match decode_message(&method, &params) {
                    Decoded::Description(description) => self.description = Some(description),
                    Decoded::Event(event) => self.pending.push_back(event),
                    Decoded::Ignored => {}
                },
                Packet::Other(_) => {}
            }
        }
    }
}

impl RemoteChannel for TradingViewChannel {
    async fn next_event(&mut self) -> Option<ChartEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.closed {
                return None;
            }

            match self.socket.next().await? {
                Ok(Message::Text(text)) => self.handle_text(&text).await,
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(err) => {
                    debug!("socket read failed for {}: {}", self.session, err);
                    return None;
                }
            }
        }
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let delete = encode_message("chart_delete_session", json!([self.session]));
        let session = self.session.clone();
        within_grace(&session, "chart_delete_session", self.socket.send(Message::Text(delete)))
            .await;
        within_grace(&session, "socket close", self.socket.close(None)).await;
    }
}

/// Await one teardown step for at most [`CLOSE_GRACE`]. Failures are only logged.
async fn within_grace<T, E, Fut>(session: &str, step: &str, fut: Fut) -> bool
where
    E: std::fmt::Display,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(CLOSE_GRACE, fut).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            debug!("{} failed for {}: {}", step, session, err);
            false
        }
        Err(_) => {
            debug!("{} timed out for {}", step, session);
            false
        }
    }
}

#[derive(Debug, PartialEq)]
enum Decoded {
    Description(String),
    Event(ChartEvent),
    Ignored,
}

fn decode_message(method: &str, params: &Value) -> Decoded {
    match method {
        "symbol_resolved" => params
            .get(2)
            .and_then(|infos| infos.get("description"))
            .and_then(Value::as_str)
            .map(|description| Decoded::Description(description.to_string()))
            .unwrap_or(Decoded::Ignored),
        "timescale_update" | "du" => match params.get(1).and_then(|data| data.get("$prices")) {
            Some(prices) => Decoded::Event(ChartEvent::Update(decode_periods(prices))),
            None => Decoded::Ignored,
        },
        m if ERROR_METHODS.contains(&m) => {
            let details: Vec<String> = params
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .skip(1)
                        .map(|item| match item {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            Decoded::Event(ChartEvent::Error(format!("{}: {}", method, details.join(" "))))
        }
        _ => Decoded::Ignored,
    }
}

/// Bars from a `$prices` payload, newest first. Each bar is `[time, open, high, low, close, ..]`.
fn decode_periods(prices: &Value) -> Vec<Period> {
    let mut periods: Vec<Period> = prices
        .get("s")
        .and_then(Value::as_array)
        .map(|bars| {
            bars.iter()
                .filter_map(|bar| {
                    let values = bar.get("v")?.as_array()?;
                    let seconds = values.first()?.as_f64()? as i64;
                    let close = values.get(4)?.as_f64()?;
                    Some(Period {
                        time: DateTime::<Utc>::from_timestamp(seconds, 0)?,
                        value: close,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    periods.sort_by(|a, b| b.time.cmp(&a.time));
    periods
}

fn next_session_id() -> String {
    let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = u64::from(Utc::now().timestamp_subsec_nanos());
    format!("cs_{:012x}", (nanos << 16) ^ counter)
}
