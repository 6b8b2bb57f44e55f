//! Symbol search controller.
//!
//! Owns one widget's search session: the debounced query, the single
//! in-flight request, result filtering, and keyboard/pointer selection.
//! Every state transition happens on the thread that calls into the
//! controller; spawned tasks only sleep or wait on the network and report
//! back through an internal channel that the host drains.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::search::filter::{DEFAULT_MAX_RESULTS, filter_results};
use crate::search::model::{Market, RawSymbol, Suggestion, Tab, dedupe};
use crate::search::source::{SourceError, SuggestionSource};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(180);

pub type SelectHandler = Box<dyn FnMut(&Suggestion) + Send>;
pub type ChangeHandler = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Dropdown visibility as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Closed,
    OpenEmpty,
    OpenLoading,
    OpenResults,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    pub query: String,
    pub active_market: Market,
    pub active_tab: Tab,
    /// Last fetched, deduplicated results before filtering.
    pub results: Vec<Suggestion>,
    pub filtered_results: Vec<Suggestion>,
    pub highlighted: Option<usize>,
    pub is_open: bool,
    pub is_loading: bool,
}

impl SearchSession {
    fn new(market: Market) -> Self {
        Self {
            query: String::new(),
            active_market: market,
            active_tab: market.default_tab(),
            results: Vec::new(),
            filtered_results: Vec::new(),
            highlighted: None,
            is_open: false,
            is_loading: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub market: Market,
    pub debounce: Duration,
    pub max_results: usize,
    pub placeholder: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            market: Market::default(),
            debounce: DEFAULT_DEBOUNCE,
            max_results: DEFAULT_MAX_RESULTS,
            placeholder: None,
        }
    }
}

impl SearchOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            market: cfg.market,
            debounce: Duration::from_millis(cfg.search.debounce_ms),
            max_results: cfg.search.max_results,
            placeholder: cfg.placeholder.clone(),
        }
    }
}

/// Owned cancellation handle for a spawned timer or request.
#[derive(Debug)]
struct TaskHandle {
    id: u64,
    token: CancellationToken,
}

impl TaskHandle {
    /// Safe to call on a handle whose task already finished or was cancelled.
    fn cancel(&self) {
        self.token.cancel();
    }
}

#[derive(Debug)]
pub(crate) enum SearchEvent {
    DebounceElapsed {
        id: u64,
        query: String,
    },
    Completed {
        id: u64,
        outcome: Result<Vec<RawSymbol>, SourceError>,
    },
}

pub struct SymbolSearchController {
    source: Arc<dyn SuggestionSource>,
    session: SearchSession,
    options: SearchOptions,
    on_select: SelectHandler,
    on_change: ChangeHandler,
    debounce: Option<TaskHandle>,
    in_flight: Option<TaskHandle>,
    next_id: u64,
    events_tx: UnboundedSender<SearchEvent>,
    events_rx: UnboundedReceiver<SearchEvent>,
}

impl SymbolSearchController {
    pub fn new(
        source: Arc<dyn SuggestionSource>,
        options: SearchOptions,
        on_change: ChangeHandler,
        on_select: SelectHandler,
    ) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            source,
            session: SearchSession::new(options.market),
            options,
            on_select,
            on_change,
            debounce: None,
            in_flight: None,
            next_id: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn query(&self) -> &str {
        &self.session.query
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.options.placeholder.as_deref()
    }

    pub fn dropdown_state(&self) -> DropdownState {
        let s = &self.session;
        if !s.is_open {
            DropdownState::Closed
        } else if s.is_loading {
            DropdownState::OpenLoading
        } else if s.filtered_results.is_empty() {
            DropdownState::OpenEmpty
        } else {
            DropdownState::OpenResults
        }
    }

    /// True while a debounce timer is armed or a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.debounce.is_some() || self.in_flight.is_some()
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.session.query = text.clone();
        (self.on_change)(&text);

        if text.trim().is_empty() {
            self.cancel_pending();
            self.session.results.clear();
            self.session.filtered_results.clear();
            self.session.is_loading = false;
            self.session.highlighted = None;
            return;
        }

        self.session.is_open = true;
        self.arm_debounce(text.trim().to_string());
    }

    pub fn set_market(&mut self, market: Market) {
        self.session.active_market = market;
        self.session.active_tab = market.default_tab();
        self.refilter();
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.session.active_tab = tab;
        self.refilter();
    }

    pub fn next_tab(&mut self) {
        self.set_tab(self.session.active_tab.next());
    }

    pub fn prev_tab(&mut self) {
        self.set_tab(self.session.active_tab.prev());
    }

    /// The first arrow press on a closed dropdown only opens it.
    pub fn move_highlight(&mut self, direction: Direction) {
        if !self.session.is_open {
            self.session.is_open = true;
            return;
        }
        let len = self.session.filtered_results.len();
        if len == 0 {
            self.session.highlighted = None;
            return;
        }
        let next = match (direction, self.session.highlighted) {
            (_, None) => 0,
            (Direction::Down, Some(i)) => i + 1,
            (Direction::Up, Some(i)) => i.saturating_sub(1),
        };
        self.session.highlighted = Some(next.min(len - 1));
    }

    pub fn hover(&mut self, index: usize) {
        if index < self.session.filtered_results.len() {
            self.session.highlighted = Some(index);
        }
    }

    pub fn commit_highlighted(&mut self) {
        let chosen = self
            .session
            .highlighted
            .and_then(|i| self.session.filtered_results.get(i))
            .cloned();
        if let Some(s) = chosen {
            self.select(s);
        }
    }

    pub fn choose(&mut self, suggestion: &Suggestion) {
        self.select(suggestion.clone());
    }

    pub fn choose_index(&mut self, index: usize) {
        if let Some(s) = self.session.filtered_results.get(index).cloned() {
            self.choose(&s);
        }
    }

    pub fn open(&mut self) {
        self.session.is_open = true;
    }

    pub fn close(&mut self) {
        self.session.is_open = false;
    }

    /// Apply every pending timer/request notification without blocking.
    /// Returns true when the session changed.
    pub fn drain_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(ev) = self.events_rx.try_recv() {
            changed |= self.apply(ev);
        }
        changed
    }

    /// Wait for the next notification and apply it.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(ev) => self.apply(ev),
            None => false,
        }
    }

    pub async fn run_until_idle(&mut self) {
        while self.is_busy() {
            self.next_event().await;
        }
    }

    /// Cancel the pending timer and abort the in-flight request.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        self.session.is_loading = false;
    }

    fn select(&mut self, suggestion: Suggestion) {
        // A late response must not reopen or overwrite the committed value.
        self.cancel_pending();
        self.session.is_loading = false;
        self.session.query = suggestion.canonical_symbol.clone();
        (self.on_change)(&self.session.query);
        debug!(symbol = %suggestion.canonical_symbol, "symbol selected");
        (self.on_select)(&suggestion);
        self.session.is_open = false;
    }

    fn refilter(&mut self) {
        let s = &mut self.session;
        s.filtered_results = filter_results(
            &s.results,
            s.active_tab,
            s.active_market,
            self.options.max_results.min(DEFAULT_MAX_RESULTS),
        );
        s.highlighted = if s.filtered_results.is_empty() {
            None
        } else {
            Some(0)
        };
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.cancel();
        }
        if let Some(req) = self.in_flight.take() {
            debug!(id = req.id, "aborting in-flight symbol search");
            req.cancel();
        }
    }

    fn arm_debounce(&mut self, query: String) {
        if let Some(prev) = self.debounce.take() {
            prev.cancel();
        }
        let id = self.next_request_id();
        let token = CancellationToken::new();
        let child = token.clone();
        let tx = self.events_tx.clone();
        let delay = self.options.debounce;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(SearchEvent::DebounceElapsed { id, query });
                }
            }
        });
        self.debounce = Some(TaskHandle { id, token });
    }

    fn start_fetch(&mut self, query: String) {
        if let Some(prev) = self.in_flight.take() {
            debug!(id = prev.id, "superseding in-flight symbol search");
            prev.cancel();
        }
        let id = self.next_request_id();
        let token = CancellationToken::new();
        let child = token.clone();
        let tx = self.events_tx.clone();
        let source = Arc::clone(&self.source);
        debug!(id, query = %query, "symbol search started");
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = child.cancelled() => return,
                res = source.search(&query, child.clone()) => res,
            };
            if child.is_cancelled() {
                return;
            }
            let _ = tx.send(SearchEvent::Completed { id, outcome });
        });
        self.in_flight = Some(TaskHandle { id, token });
        self.session.is_loading = true;
    }

    pub(crate) fn apply(&mut self, event: SearchEvent) -> bool {
        match event {
            SearchEvent::DebounceElapsed { id, query } => {
                if self.debounce.as_ref().map(|h| h.id) != Some(id) {
                    debug!(id, "ignoring stale debounce timer");
                    return false;
                }
                self.debounce = None;
                self.start_fetch(query);
                true
            }
            SearchEvent::Completed { id, outcome } => {
                if self.in_flight.as_ref().map(|h| h.id) != Some(id) {
                    debug!(id, "dropping superseded symbol search response");
                    return false;
                }
                self.in_flight = None;
                match outcome {
                    Ok(raw) => {
                        self.session.results = dedupe(raw);
                        debug!(id, count = self.session.results.len(), "symbol search completed");
                    }
                    Err(SourceError::Cancelled) => {
                        self.session.is_loading = false;
                        return true;
                    }
                    Err(e) => {
                        warn!(id, error = %e, "symbol search failed");
                        self.session.results.clear();
                    }
                }
                self.session.is_loading = false;
                self.refilter();
                true
            }
        }
    }
}

impl Drop for SymbolSearchController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
