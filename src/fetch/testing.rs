//! Scripted in-memory chart source used by the fetch tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::config::MarketConfig;
use crate::error::AppError;

use super::channel::{ChannelFactory, ChartEvent, Period, RemoteChannel, SeriesRequest};
use super::offset::TimeOffset;
use super::FetchResult;

#[derive(Debug, Clone)]
enum Step {
    Wait(Duration),
    Emit(ChartEvent),
    HangUp,
}

/// What a scripted channel does once opened. Exhausted scripts go silent.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    open_error: Option<String>,
    open_stalls: bool,
    steps: Vec<Step>,
}

fn period(value: f64) -> Period {
    Period {
        time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        value,
    }
}

impl Script {
    pub fn value(value: f64) -> Self {
        Self {
            open_error: None,
            open_stalls: false,
            steps: vec![Step::Emit(ChartEvent::Update(vec![period(value)]))],
        }
    }

    pub fn delayed_value(delay: Duration, value: f64) -> Self {
        Self {
            open_error: None,
            open_stalls: false,
            steps: vec![
                Step::Wait(delay),
                Step::Emit(ChartEvent::Update(vec![period(value)])),
            ],
        }
    }

    pub fn empty_then_value(delay: Duration, value: f64) -> Self {
        Self {
            open_error: None,
            open_stalls: false,
            steps: vec![
                Step::Emit(ChartEvent::Update(Vec::new())),
                Step::Wait(delay),
                Step::Emit(ChartEvent::Update(vec![period(value)])),
            ],
        }
    }

    pub fn error(text: &str) -> Self {
        Self {
            open_error: None,
            open_stalls: false,
            steps: vec![Step::Emit(ChartEvent::Error(text.to_string()))],
        }
    }

    pub fn hang_up() -> Self {
        Self {
            open_error: None,
            open_stalls: false,
            steps: vec![Step::HangUp],
        }
    }

    pub fn open_error(text: &str) -> Self {
        Self {
            open_error: Some(text.to_string()),
            open_stalls: false,
            steps: Vec::new(),
        }
    }

    /// `open` never completes.
    pub fn stalled_open() -> Self {
        Self {
            open_error: None,
            open_stalls: true,
            steps: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Shared {
    opens: usize,
    closes: usize,
    requests: Vec<SeriesRequest>,
    active: HashMap<String, usize>,
    max_active_markets: usize,
}

impl Shared {
    fn release(&mut self, market_key: &str) {
        if let Some(count) = self.active.get_mut(market_key) {
            *count -= 1;
            if *count == 0 {
                self.active.remove(market_key);
            }
        }
    }
}

/// Factory whose channels follow per-(identifier, offset) scripts. Unscripted queries stay
/// silent forever; `default_script` replaces that fallback.
#[derive(Default)]
pub(crate) struct ScriptedFactory {
    market: MarketConfig,
    scripts: HashMap<(String, TimeOffset), (Script, String)>,
    fallback: Option<Script>,
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, identifier: &str, offset: TimeOffset, script: Script) -> Self {
        let key = self.market.market_key(identifier);
        let description = format!("{} whales", identifier.trim().to_uppercase());
        self.scripts.insert((key, offset), (script, description));
        self
    }

    pub fn default_script(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    pub fn opens(&self) -> usize {
        self.shared.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.shared.lock().unwrap().closes
    }

    pub fn requests(&self) -> Vec<SeriesRequest> {
        self.shared.lock().unwrap().requests.clone()
    }

    /// Highest number of distinct markets that had an open channel at the same time.
    pub fn max_active_markets(&self) -> usize {
        self.shared.lock().unwrap().max_active_markets
    }
}

impl ChannelFactory for ScriptedFactory {
    type Channel = ScriptedChannel;

    async fn open(&self, request: &SeriesRequest) -> FetchResult<ScriptedChannel> {
        let (script, description) = match self
            .scripts
            .get(&(request.market_key.clone(), request.offset))
        {
            Some((script, description)) => (script.clone(), Some(description.clone())),
            None => (self.fallback.clone().unwrap_or_default(), None),
        };

        self.shared.lock().unwrap().requests.push(request.clone());
        if script.open_stalls {
            std::future::pending::<()>().await;
        }

        let mut shared = self.shared.lock().unwrap();
        if let Some(reason) = script.open_error {
            return Err(AppError::channel_open(&request.market_key, reason));
        }

        shared.opens += 1;
        *shared.active.entry(request.market_key.clone()).or_default() += 1;
        let active = shared.active.len();
        shared.max_active_markets = shared.max_active_markets.max(active);

        Ok(ScriptedChannel {
            market_key: request.market_key.clone(),
            description,
            steps: script.steps.into(),
            closed: false,
            shared: Arc::clone(&self.shared),
        })
    }
}

pub(crate) struct ScriptedChannel {
    market_key: String,
    description: Option<String>,
    steps: VecDeque<Step>,
    closed: bool,
    shared: Arc<Mutex<Shared>>,
}

impl RemoteChannel for ScriptedChannel {
    async fn next_event(&mut self) -> Option<ChartEvent> {
        loop {
            match self.steps.pop_front() {
                Some(Step::Wait(delay)) => tokio::time::sleep(delay).await,
                Some(Step::Emit(event)) => return Some(event),
                Some(Step::HangUp) => return None,
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn close(&mut self) {
        let mut shared = self.shared.lock().unwrap();
        shared.closes += 1;
        if !self.closed {
            self.closed = true;
            shared.release(&self.market_key);
        }
    }
}

impl Drop for ScriptedChannel {
    fn drop(&mut self) {
        if !self.closed {
            if let Ok(mut shared) = self.shared.lock() {
                shared.release(&self.market_key);
            }
        }
    }
}
