// src/pipeline/control.rs

//! Cooperative pause/resume/stop control for a crawl invocation.
//!
//! The host holds a [`CrawlControl`] and the engine holds the matching
//! [`ControlReceiver`]. Commands are a tri-state flag delivered over a
//! watch channel; the engine observes them only at yield points
//! (discovery iteration and per-item boundaries), so in-flight
//! operations always run to completion first. Pausing blocks the
//! engine on the channel rather than busy-waiting, and resuming
//! releases it before the next unit of work.

use tokio::sync::watch;

/// Tri-state crawl command set by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrawlCommand {
    /// Proceed normally
    #[default]
    Run,
    /// Suspend before the next unit of work
    Pause,
    /// Terminate at the next yield point, keeping collected results
    Stop,
}

/// Lifecycle of one crawl invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Constructed, not yet running
    Idle,
    /// Crawl in progress
    Running,
    /// Suspended at a yield point
    Paused,
    /// Terminated early by a stop command; partial results are valid
    Stopped,
    /// Completed normally
    Done,
    /// Aborted by a fatal error
    Failed,
}

/// What a yield-point check decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Keep going
    Proceed,
    /// Keep going; a pause was just released
    Resumed,
    /// Terminate now
    Stop,
}

/// Host-side handle delivering commands into a running crawl.
#[derive(Debug, Clone)]
pub struct CrawlControl {
    tx: watch::Sender<CrawlCommand>,
}

impl CrawlControl {
    /// Create a control handle and the receiver to construct an engine with.
    pub fn channel() -> (Self, ControlReceiver) {
        let (tx, rx) = watch::channel(CrawlCommand::Run);
        (Self { tx }, ControlReceiver { rx })
    }

    /// Request a pause before the next unit of work.
    pub fn pause(&self) {
        let _ = self.tx.send(CrawlCommand::Pause);
    }

    /// Release a pause.
    pub fn resume(&self) {
        let _ = self.tx.send(CrawlCommand::Run);
    }

    /// Request termination at the next yield point.
    pub fn stop(&self) {
        let _ = self.tx.send(CrawlCommand::Stop);
    }

    /// The command currently in effect.
    pub fn command(&self) -> CrawlCommand {
        *self.tx.borrow()
    }
}

/// Engine-side receiver polled at yield points.
#[derive(Debug)]
pub struct ControlReceiver {
    rx: watch::Receiver<CrawlCommand>,
}

impl ControlReceiver {
    /// A receiver with no attached host control; never pauses or stops.
    pub fn detached() -> Self {
        let (tx, rx) = watch::channel(CrawlCommand::Run);
        drop(tx);
        Self { rx }
    }

    /// The command currently in effect.
    pub fn current(&self) -> CrawlCommand {
        *self.rx.borrow()
    }

    /// Yield-point check. Returns immediately under `Run`, blocks on
    /// the channel while `Pause` is in effect, and reports `Stop` when
    /// commanded. A control handle dropped mid-pause counts as stop:
    /// nobody is left to resume the crawl.
    pub async fn checkpoint(&mut self) -> Checkpoint {
        let mut was_paused = false;
        loop {
            let command = *self.rx.borrow();
            match command {
                CrawlCommand::Stop => return Checkpoint::Stop,
                CrawlCommand::Run => {
                    return if was_paused {
                        Checkpoint::Resumed
                    } else {
                        Checkpoint::Proceed
                    };
                }
                CrawlCommand::Pause => was_paused = true,
            }

            if self.rx.changed().await.is_err() {
                return Checkpoint::Stop;
            }
        }
    }
}
