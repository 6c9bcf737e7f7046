//! Events for the TUI loop
//!
//! Terminal input is polled on its own thread. Change-feed callbacks send
//! on the same channel, so store snapshots and key presses are handled in
//! the order they happened.

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::storage::StoreEvent;

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Periodic housekeeping: expire toasts, pick up changes, refresh rates
    Tick,
    /// Snapshot from a store subscription
    Store(StoreEvent),
}

pub struct EventHandler {
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Start the input thread with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        let input = sender.clone();
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);

                match event::poll(timeout) {
                    Ok(true) => {
                        let sent = match event::read() {
                            Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                                input.send(Event::Key(key))
                            }
                            Ok(CrosstermEvent::Resize(w, h)) => input.send(Event::Resize(w, h)),
                            Ok(_) => Ok(()),
                            Err(e) => {
                                warn!(error = %e, "failed to read terminal event");
                                Ok(())
                            }
                        };
                        if sent.is_err() {
                            return;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, "terminal polling stopped");
                        return;
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if input.send(Event::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { sender, receiver }
    }

    /// Sender for store subscriptions
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.sender.clone()
    }

    /// Next event (blocking)
    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Events that are already waiting
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
