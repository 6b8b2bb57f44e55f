use anyhow::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::crossterm::{execute, terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::search::Direction;
use crate::tui::state::TuiApp;

type TerminalType = Terminal<CrosstermBackend<io::Stdout>>;

impl TuiApp {
    pub fn run(&mut self) -> Result<()> {
        struct TuiGuard;
        impl Drop for TuiGuard {
            fn drop(&mut self) {
                let mut stdout = io::stdout();
                let _ = execute!(stdout, terminal::LeaveAlternateScreen, DisableMouseCapture);
                let _ = terminal::disable_raw_mode();
            }
        }
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)?;
        let _guard = TuiGuard;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let res = self.event_loop(&mut terminal);
        // Unmount: no timer or request may outlive the widget.
        self.controller.shutdown();
        res
    }

    fn event_loop(&mut self, terminal: &mut TerminalType) -> Result<()> {
        let mut last_spinner_update = Instant::now();
        loop {
            if self.controller.drain_events() {
                self.dirty = true;
            }
            if self.drain_inbox() {
                self.dirty = true;
            }

            if self.controller.session().is_loading
                && last_spinner_update.elapsed() >= Duration::from_millis(120)
            {
                self.spinner_state = self.spinner_state.wrapping_add(1);
                last_spinner_update = Instant::now();
                self.dirty = true;
            }

            if self.dirty {
                terminal.draw(|f| self.view(f))?;
                self.dirty = false;
            }

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if self.handle_key(k) {
                            info!("exit requested");
                            return Ok(());
                        }
                    }
                    Event::Mouse(m) => self.handle_mouse(m),
                    Event::Resize(_, _) => self.dirty = true,
                    _ => {}
                }
            }
        }
    }

    /// Returns true when the application should exit.
    pub fn handle_key(&mut self, k: KeyEvent) -> bool {
        if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
            let now = Instant::now();
            if let Some(prev) = self.last_ctrl_c_at {
                if now.duration_since(prev) <= Duration::from_secs(3) {
                    return true;
                }
            }
            self.last_ctrl_c_at = Some(now);
            self.controller.close();
            self.dirty = true;
            return false;
        }

        match k.code {
            KeyCode::Esc => {
                if !self.controller.session().is_open {
                    return true;
                }
                self.controller.close();
            }
            KeyCode::Enter => self.controller.commit_highlighted(),
            KeyCode::Up => self.controller.move_highlight(Direction::Up),
            KeyCode::Down => self.controller.move_highlight(Direction::Down),
            KeyCode::Tab => self.controller.next_tab(),
            KeyCode::BackTab => self.controller.prev_tab(),
            KeyCode::F(2) => {
                let market = self.controller.session().active_market.toggled();
                debug!(target: "tui", %market, "market switched");
                self.controller.set_market(market);
            }
            KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                self.controller.set_query("");
            }
            KeyCode::Backspace => {
                let mut q = self.controller.query().to_string();
                q.pop();
                self.controller.set_query(q);
            }
            KeyCode::Char(c) => {
                let mut q = self.controller.query().to_string();
                q.push(c);
                self.controller.set_query(q);
            }
            _ => return false,
        }
        self.dirty = true;
        false
    }

    pub fn handle_mouse(&mut self, m: MouseEvent) {
        match m.kind {
            MouseEventKind::Moved => {
                if let Some(i) = self.hit.row_at(m.column, m.row) {
                    self.controller.hover(i);
                    self.dirty = true;
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(i) = self.hit.row_at(m.column, m.row) {
                    self.controller.choose_index(i);
                } else if self.hit.in_input(m.column, m.row) {
                    self.controller.open();
                } else if let Some(tab) = self.hit.tab_at(m.column, m.row) {
                    self.controller.set_tab(tab);
                } else {
                    self.controller.close();
                }
                self.dirty = true;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::model::RawSymbol;
    use crate::search::source::{SourceError, SuggestionSource};
    use crate::search::{DropdownState, Market, SearchOptions, Tab};
    use async_trait::async_trait;
    use ratatui::crossterm::event::KeyEventState;
    use ratatui::layout::Rect;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct StaticSource;

    #[async_trait]
    impl SuggestionSource for StaticSource {
        async fn search(
            &self,
            _query: &str,
            _cancel: CancellationToken,
        ) -> Result<Vec<RawSymbol>, SourceError> {
            Ok(vec![
                RawSymbol {
                    full_name: Some("NSE:RELIANCE".into()),
                    symbol: Some("RELIANCE".into()),
                    exchange: Some("NSE".into()),
                    kind: Some("stock".into()),
                    ..RawSymbol::default()
                },
                RawSymbol {
                    full_name: Some("NSE:TCS".into()),
                    symbol: Some("TCS".into()),
                    exchange: Some("NSE".into()),
                    kind: Some("stock".into()),
                    ..RawSymbol::default()
                },
            ])
        }
    }

    fn app() -> TuiApp {
        TuiApp::new(
            "test",
            Arc::new(StaticSource),
            SearchOptions {
                market: Market::India,
                ..SearchOptions::default()
            },
            "dark",
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    async fn loaded_app() -> TuiApp {
        let mut app = app();
        for c in "RELI".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.controller.run_until_idle().await;
        app
    }

    #[tokio::test(start_paused = true)]
    async fn typing_builds_query_and_backspace_edits_it() {
        let mut app = app();
        for c in "TCSX".chars() {
            assert!(!app.handle_key(key(KeyCode::Char(c))));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.controller.query(), "TCS");
        assert!(app.controller.session().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_commits_highlighted_row_to_host() {
        let mut app = loaded_app().await;
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.drain_inbox());
        assert_eq!(
            app.selected.as_ref().map(|s| s.canonical_symbol.as_str()),
            Some("NSE:TCS")
        );
        assert_eq!(app.controller.query(), "NSE:TCS");
    }

    #[tokio::test(start_paused = true)]
    async fn escape_closes_then_exits() {
        let mut app = loaded_app().await;
        assert!(!app.handle_key(key(KeyCode::Esc)));
        assert_eq!(app.controller.dropdown_state(), DropdownState::Closed);
        assert!(app.handle_key(key(KeyCode::Esc)));
    }

    #[tokio::test(start_paused = true)]
    async fn tab_keys_and_market_toggle() {
        let mut app = app();
        assert_eq!(app.controller.session().active_tab, Tab::Stocks);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.controller.session().active_tab, Tab::Funds);
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.controller.session().active_tab, Tab::All);
        app.handle_key(key(KeyCode::F(2)));
        assert_eq!(app.controller.session().active_market, Market::Forex);
        assert_eq!(app.controller.session().active_tab, Tab::Forex);
    }

    #[tokio::test(start_paused = true)]
    async fn double_ctrl_c_exits() {
        let mut app = app();
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        assert!(!app.handle_key(ctrl_c));
        assert!(app.handle_key(ctrl_c));
    }

    #[tokio::test(start_paused = true)]
    async fn mouse_hover_click_and_outside_click() {
        let mut app = loaded_app().await;
        app.hit.input = Rect::new(0, 1, 40, 3);
        app.hit.rows = Some((Rect::new(1, 6, 38, 10), 0));

        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            ..click(5, 7)
        });
        assert_eq!(app.controller.session().highlighted, Some(1));

        app.handle_mouse(click(60, 30));
        assert_eq!(app.controller.dropdown_state(), DropdownState::Closed);

        app.handle_mouse(click(3, 2));
        assert!(app.controller.session().is_open);

        app.handle_mouse(click(5, 6));
        app.drain_inbox();
        assert_eq!(
            app.selected.as_ref().map(|s| s.canonical_symbol.as_str()),
            Some("NSE:RELIANCE")
        );
        assert!(!app.controller.session().is_open);
    }
}
