//! Terminal ownership for the controller.
//!
//! `Tui` puts the terminal into raw mode on the alternate screen, merges
//! crossterm input with coalesced redraw requests into one stream, and
//! puts everything back on drop or panic.

use anyhow::Result;
use crossterm::event::Event as TermEvent;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::stdout;
use std::io::Stdout;
use std::pin::Pin;
use std::time::Duration;
use tokio::select;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Input the controller reacts to.
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    /// Time to redraw: a scheduled frame came due or the window resized.
    Draw,
}

pub struct Tui {
    terminal: Terminal<TerminalBackend>,
    frame_tx: mpsc::UnboundedSender<Instant>,
    draw_tx: broadcast::Sender<()>,
    restored: bool,
}

impl Tui {
    /// Take over the terminal. Must be called inside a Tokio runtime.
    pub fn init() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;
        install_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (draw_tx, _) = broadcast::channel(1);
        tokio::spawn(schedule_frames(frame_rx, draw_tx.clone()));

        Ok(Self {
            terminal,
            frame_tx,
            draw_tx,
            restored: false,
        })
    }

    /// Leave the alternate screen and raw mode. Safe to call twice.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn frame_requester(&self) -> FrameRequester {
        FrameRequester {
            frame_tx: self.frame_tx.clone(),
        }
    }

    /// Key presses and redraw ticks, in arrival order.
    ///
    /// Key releases and repeats are dropped so each press acts once.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let mut input = crossterm::event::EventStream::new();
        let mut draws = self.draw_tx.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                select! {
                    Some(Ok(event)) = input.next() => match event {
                        TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                            yield TuiEvent::Key(key);
                        }
                        TermEvent::Resize(_, _) => {
                            yield TuiEvent::Draw;
                        }
                        _ => {}
                    },
                    draw = draws.recv() => match draw {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            yield TuiEvent::Draw;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    pub fn draw<F>(&mut self, render: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(render)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Cheap handle for asking the terminal to redraw.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_tx: mpsc::UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.frame_tx.send(Instant::now());
    }

    pub fn schedule_frame_in(&self, delay: Duration) {
        let _ = self.frame_tx.send(Instant::now() + delay);
    }
}

/// Collapse every pending request into one draw at the earliest deadline.
async fn schedule_frames(mut requests: mpsc::UnboundedReceiver<Instant>, draw_tx: broadcast::Sender<()>) {
    let mut deadline: Option<Instant> = None;

    loop {
        let due = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        select! {
            request = requests.recv() => match request {
                Some(at) => deadline = Some(deadline.map_or(at, |current| current.min(at))),
                None => break,
            },
            () = due => {
                deadline = None;
                let _ = draw_tx.send(());
            }
        }
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scheduler_coalesces_requests_into_one_draw() {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (draw_tx, mut draw_rx) = broadcast::channel(4);
        let scheduler = tokio::spawn(schedule_frames(frame_rx, draw_tx));

        let requester = FrameRequester { frame_tx };
        requester.schedule_frame_in(Duration::from_millis(30));
        requester.schedule_frame_in(Duration::from_millis(10));
        requester.schedule_frame_in(Duration::from_millis(20));

        tokio::time::timeout(Duration::from_secs(2), draw_rx.recv())
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(draw_rx.try_recv().is_err());

        drop(requester);
        scheduler.await.unwrap();
    }
}
