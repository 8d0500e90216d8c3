//! Controller state and event loop.
//!
//! `App` owns what the screen shows and multiplexes core events with
//! terminal input using `tokio::select!`.

use anyhow::Result;
use crossterm::event::KeyEvent;
use pf_protocol::ipc::{Event, Op};
use pf_protocol::role_models::{ActionKind, RoleKind, RoleObservation};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::collections::HashSet;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_stream::StreamExt;

use crate::event_handler;
use crate::tui::{Tui, TuiEvent};
use crate::widgets::render_role_table;

/// How the status line is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Neutral,
    Running,
    Stopped,
    Failure,
}

impl StatusTone {
    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Started => StatusTone::Running,
            ActionKind::Stopped | ActionKind::NothingToStop => StatusTone::Stopped,
            ActionKind::AlreadyStarting | ActionKind::AlreadyRunning => StatusTone::Neutral,
            ActionKind::Failed => StatusTone::Failure,
        }
    }

    fn color(self) -> Color {
        match self {
            StatusTone::Neutral => Color::White,
            StatusTone::Running => Color::Green,
            StatusTone::Stopped => Color::Gray,
            StatusTone::Failure => Color::Red,
        }
    }
}

/// Everything the controller screen displays.
#[derive(Debug, Clone)]
pub struct ControllerState {
    /// One entry per role, in display order.
    pub roles: Vec<RoleObservation>,
    /// Roles with a toggle queued or running.
    pub in_flight: HashSet<RoleKind>,
    pub status_line: String,
    pub status_tone: StatusTone,
}

impl ControllerState {
    pub fn new() -> Self {
        Self {
            roles: RoleKind::ALL.into_iter().map(RoleObservation::new).collect(),
            in_flight: HashSet::new(),
            status_line: "Ready".to_string(),
            status_tone: StatusTone::Neutral,
        }
    }

    pub fn role(&self, role: RoleKind) -> Option<&RoleObservation> {
        self.roles.iter().find(|o| o.role == role)
    }

    pub fn role_mut(&mut self, role: RoleKind) -> Option<&mut RoleObservation> {
        self.roles.iter_mut().find(|o| o.role == role)
    }

    pub fn set_status(&mut self, line: impl Into<String>, tone: StatusTone) {
        self.status_line = line.into();
        self.status_tone = tone;
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

/// The controller application.
pub struct App {
    pub state: ControllerState,
    /// Where the web server is reachable from other devices.
    pub address: String,
    pub op_tx: Sender<Op>,
    pub event_rx: Receiver<Event>,
    pub should_exit: bool,
}

impl App {
    pub fn new(address: String, op_tx: Sender<Op>, event_rx: Receiver<Event>) -> Self {
        Self {
            state: ControllerState::new(),
            address,
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Run until the user quits or the core side hangs up.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        self.handle_core_event(event);
                        frames.schedule_frame();
                    }
                    None => {
                        tracing::warn!("Core event channel closed");
                        self.should_exit = true;
                    }
                },
                Some(tui_event) = tui_events.next() => match tui_event {
                    TuiEvent::Key(key_event) => {
                        self.handle_key_event(key_event);
                        frames.schedule_frame();
                    }
                    TuiEvent::Draw => tui.draw(|frame| self.render(frame))?,
                },
            }
        }

        Ok(())
    }

    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.state, event);
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        self.should_exit = event_handler::handle_keyboard_event(key_event, &mut self.state, &self.op_tx);
    }

    /// Header with the address, the role table, the status line and key help.
    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        render_role_table(frame, chunks[1], &self.state.roles, &self.state.in_flight);
        self.render_status(frame, chunks[2]);
        render_help(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::raw("Web address: "),
            Span::styled(
                self.address.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let header = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Photo Frame Controller"),
        );
        frame.render_widget(header, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let status = Paragraph::new(self.state.status_line.as_str())
            .style(Style::default().fg(self.state.status_tone.color()))
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, area);
    }
}

fn render_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("s: toggle server   l: toggle slideshow   r: refresh   q: quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;
    use pf_protocol::role_models::ActionReport;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::mpsc::channel;

    fn app() -> (App, tokio::sync::mpsc::Receiver<Op>) {
        let (op_tx, op_rx) = channel(8);
        let (_event_tx, event_rx) = channel(8);
        (
            App::new("http://192.168.1.20:5000".to_string(), op_tx, event_rx),
            op_rx,
        )
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_app_renders_address_roles_and_status() {
        let (app, _op_rx) = app();

        let content = screen(&app);

        assert!(content.contains("Photo Frame Controller"));
        assert!(content.contains("http://192.168.1.20:5000"));
        assert!(content.contains("Server"));
        assert!(content.contains("Slideshow"));
        assert!(content.contains("Ready"));
        assert!(content.contains("q: quit"));
    }

    #[tokio::test]
    async fn test_app_shows_completed_action() {
        let (mut app, _op_rx) = app();

        app.handle_core_event(Event::RoleStatus {
            role: RoleKind::Slideshow,
            running: false,
        });
        app.handle_core_event(Event::ActionCompleted {
            report: ActionReport {
                role: RoleKind::Slideshow,
                kind: ActionKind::Stopped,
                message: "Slideshow stopped".to_string(),
            },
        });

        let content = screen(&app);
        assert!(content.contains("Slideshow stopped"));
    }

    #[tokio::test]
    async fn test_app_quit_on_q() {
        let (mut app, _op_rx) = app();
        assert!(!app.should_exit);

        app.handle_key_event(KeyEvent::from(KeyCode::Char('q')));

        assert!(app.should_exit);
    }

    #[tokio::test]
    async fn test_app_refresh_key_sends_op() {
        let (mut app, mut op_rx) = app();

        app.handle_key_event(KeyEvent::from(KeyCode::Char('r')));

        assert_eq!(op_rx.try_recv().unwrap(), Op::RefreshStatus);
        assert_eq!(app.state.status_line, "Refreshing...");
    }
}
