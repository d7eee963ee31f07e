//! Async event loop driving a session.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::info;

use crate::connection::{Transport, TransportEvent};
use crate::session::client::Session;
use crate::session::settings::SettingsUpdate;
use crate::types::PointerSample;

const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(10);

/// Input from the host page to a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PointerMoved(PointerSample),
    PointerLeft,
    Update(SettingsUpdate),
    /// Reconnect after the connection was lost
    Reopen,
    /// Unmount: tear down and stop the loop
    Shutdown,
}

impl<T: Transport> Session<T> {
    /// Runs the session until `Shutdown` or until the command channel closes.
    ///
    /// Transport events and host commands are handled one at a time in
    /// arrival order. When idle eviction is configured, a sweep runs every
    /// half window. The session is dropped on return, which tears the
    /// connection down.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let mut sweep = self.stale_after().map(|ttl| {
            let mut interval = tokio::time::interval((ttl / 2).max(MIN_SWEEP_PERIOD));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                Some(event) = events.recv() => self.handle_transport_event(event),
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.execute(command),
                },
                _ = next_sweep(&mut sweep) => {
                    self.evict_stale(Instant::now().into_std());
                }
            }
        }

        info!(participant = %self.local_id(), "cursor session shutting down");
    }

    /// Applies one host command
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::PointerMoved(sample) => {
                self.pointer_moved(sample, Instant::now().into_std())
            }
            Command::PointerLeft => self.pointer_left(),
            Command::Update(update) => self.apply(update),
            Command::Reopen => self.reopen(),
            Command::Shutdown => self.disconnect(),
        }
    }
}

async fn next_sweep(sweep: &mut Option<Interval>) {
    match sweep {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
