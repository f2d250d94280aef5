use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Terminal events
#[derive(Clone, Debug)]
pub enum Event {
    /// Periodic tick, drives re-rendering while idle
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Error reading from the terminal
    Error(String),
}

/// Reads terminal input on a background task and merges it with a render
/// tick into one event channel.
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
    #[allow(dead_code)]
    task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(read_events(sender, cancel.clone(), tick_rate));

        Self {
            receiver,
            cancel,
            task,
        }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Shutdown the event handler
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn read_events(
    sender: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
) {
    let mut reader = event::EventStream::new();
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                let _ = sender.send(Event::Tick);
            }

            maybe_event = reader.next().fuse() => match maybe_event {
                Some(Ok(CrosstermEvent::Key(key))) => {
                    // Ignore release events (important for Windows)
                    if key.kind == KeyEventKind::Press {
                        let _ = sender.send(Event::Key(key));
                    }
                }
                Some(Ok(CrosstermEvent::Resize(w, h))) => {
                    let _ = sender.send(Event::Resize(w, h));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = sender.send(Event::Error(e.to_string()));
                }
                None => break,
            },
        }
    }
}
