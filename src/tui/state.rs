use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Instant;
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::search::filter::badge;
use crate::search::{
    DropdownState, SearchOptions, Suggestion, SuggestionSource, SymbolSearchController, Tab,
};
use crate::tui::theme::Theme;

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Screen regions from the most recent render, used for mouse hit-testing.
/// Replaced on every draw.
#[derive(Debug, Clone, Default)]
pub struct HitAreas {
    pub input: Rect,
    pub tabs: Vec<(Rect, Tab)>,
    /// Inner area of the result list (borders excluded) and its scroll offset.
    pub rows: Option<(Rect, usize)>,
}

impl HitAreas {
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let (area, offset) = self.rows?;
        if contains(area, column, row) {
            Some(offset + (row - area.y) as usize)
        } else {
            None
        }
    }

    pub fn tab_at(&self, column: u16, row: u16) -> Option<Tab> {
        self.tabs
            .iter()
            .find(|(area, _)| contains(*area, column, row))
            .map(|(_, tab)| *tab)
    }

    pub fn in_input(&self, column: u16, row: u16) -> bool {
        contains(self.input, column, row)
    }
}

pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

pub struct TuiApp {
    pub title: String,
    pub controller: SymbolSearchController,
    pub theme: Theme,
    /// Last symbol committed through the selection callback.
    pub selected: Option<Suggestion>,
    pub(crate) inbox_rx: Receiver<Suggestion>,
    pub spinner_state: usize,
    pub hit: HitAreas,
    pub list_state: ListState,
    pub dirty: bool,
    pub(crate) last_ctrl_c_at: Option<Instant>,
}

impl TuiApp {
    pub fn new(
        title: impl Into<String>,
        source: Arc<dyn SuggestionSource>,
        options: SearchOptions,
        theme_name: &str,
    ) -> Self {
        let (tx, rx) = channel();
        let controller = SymbolSearchController::new(
            source,
            options,
            Box::new(|q: &str| debug!(target: "tui", query = q, "input changed")),
            Box::new(move |s: &Suggestion| {
                let _ = tx.send(s.clone());
            }),
        );
        Self {
            title: title.into(),
            controller,
            theme: Theme::by_name(theme_name),
            selected: None,
            inbox_rx: rx,
            spinner_state: 0,
            hit: HitAreas::default(),
            list_state: ListState::default(),
            dirty: true,
            last_ctrl_c_at: None,
        }
    }

    /// Pull committed selections delivered through the callback.
    pub fn drain_inbox(&mut self) -> bool {
        let mut changed = false;
        while let Ok(s) = self.inbox_rx.try_recv() {
            debug!(target: "tui", symbol = %s.canonical_symbol, "selection committed");
            self.selected = Some(s);
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPlan {
    pub badge: String,
    pub symbol: String,
    pub description: String,
    pub exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub header: String,
    pub input_text: String,
    pub show_placeholder: bool,
    pub tab_index: usize,
    pub status: String,
    pub rows: Vec<RowPlan>,
    pub highlighted: Option<usize>,
    /// Shown instead of rows when the dropdown is open but empty.
    pub message: Option<String>,
    pub footer: String,
}

pub fn truncate_display(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut width = 0usize;
    let mut out = String::new();
    for ch in s.chars() {
        let ch_w = ch.width().unwrap_or(0);
        if ch_w == 0 {
            out.push(ch);
            continue;
        }
        if width + ch_w > max {
            break;
        }
        out.push(ch);
        width += ch_w;
    }
    out
}

pub fn build_render_plan(
    title: &str,
    controller: &SymbolSearchController,
    selected: Option<&Suggestion>,
    spinner_state: usize,
    width: u16,
) -> RenderPlan {
    let w = width as usize;
    let session = controller.session();
    let state = controller.dropdown_state();

    let picked = selected
        .map(|s| s.canonical_symbol.as_str())
        .unwrap_or("-");
    let header = truncate_display(
        &format!(
            "{title} | market: {}  selected: {picked}",
            session.active_market
        ),
        w,
    );

    let show_placeholder = session.query.is_empty();
    let input_text = if show_placeholder {
        controller
            .placeholder()
            .unwrap_or("Search symbol")
            .to_string()
    } else {
        session.query.clone()
    };

    let status = match state {
        DropdownState::Closed => String::new(),
        DropdownState::OpenLoading => {
            let spin = SPINNER_CHARS[spinner_state % SPINNER_CHARS.len()];
            format!("Searching {spin}")
        }
        DropdownState::OpenEmpty | DropdownState::OpenResults => {
            format!("{} results", session.filtered_results.len())
        }
    };

    let rows: Vec<RowPlan> = if state == DropdownState::Closed {
        Vec::new()
    } else {
        session
            .filtered_results
            .iter()
            .map(|s| RowPlan {
                badge: badge(s),
                symbol: s.canonical_symbol.clone(),
                description: s.description.clone().unwrap_or_default(),
                exchange: s.exchange.clone().unwrap_or_default(),
            })
            .collect()
    };

    // Failed fetches and zero matches look the same here.
    let message = match state {
        DropdownState::OpenEmpty if session.query.trim().is_empty() => {
            Some("Type a symbol to search".to_string())
        }
        DropdownState::OpenEmpty => Some("No symbols match".to_string()),
        DropdownState::OpenLoading if rows.is_empty() => Some("Searching...".to_string()),
        _ => None,
    };

    let footer = truncate_display(
        "↑↓ move  Enter select  Tab/S-Tab filter  F2 market  Esc close  Ctrl+C×2 quit",
        w,
    );

    RenderPlan {
        header,
        input_text,
        show_placeholder,
        tab_index: session.active_tab.position(),
        status,
        rows,
        highlighted: if state == DropdownState::Closed {
            None
        } else {
            session.highlighted
        },
        message,
        footer,
    }
}
