use std::time::Duration;

use crossterm::event::{Event as TermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Tick,
    /// Auto-refresh interval elapsed
    Refresh,
    Resize,
}

/// Merges terminal input, a UI tick and the auto-refresh timer into one
/// channel. The reader task stops once the handler is dropped.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, refresh_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);
            let mut refresh = tokio::time::interval(refresh_interval);

            // The first refresh tick fires immediately; the initial fetch is
            // already running by then
            refresh.tick().await;

            loop {
                let event = tokio::select! {
                    maybe_event = reader.next() => match maybe_event {
                        // Press only, Windows also reports releases
                        Some(Ok(TermEvent::Key(key))) if key.kind == KeyEventKind::Press => Event::Key(key),
                        Some(Ok(TermEvent::Resize(_, _))) => Event::Resize,
                        Some(Ok(_)) => continue,
                        Some(Err(_)) | None => break,
                    },
                    _ = tick.tick() => Event::Tick,
                    _ = refresh.tick() => Event::Refresh,
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        EventHandler { rx }
    }

    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.unwrap_or(Event::Tick)
    }
}
