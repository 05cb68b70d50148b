//! Single-threaded match actor.
//!
//! A [`MatchWorker`] moves a [`Match`] onto its own thread and applies commands from a
//! channel one at a time, so callers on any thread see a strictly serialized match.
//! The worker also wakes every [`SPAWN_RETRY_INTERVAL`] to retry pending spawns.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::error::{MatchError, WorkerError};
use crate::game::{
    ActionOutcome, ActionRequest, Clock, Match, MatchEvent, PlayerId, SimTime,
    SPAWN_RETRY_INTERVAL,
};

type Job = Box<dyn FnOnce(&mut Match, SimTime) + Send>;

enum Command {
    Join {
        id: PlayerId,
        name: String,
        reply: Sender<Result<(), MatchError>>,
    },
    BuildGrid {
        reply: Sender<Result<(), MatchError>>,
    },
    EnsureSpawn {
        player: PlayerId,
    },
    Submit {
        request: ActionRequest,
        reply: Sender<ActionOutcome>,
    },
    DrainEvents {
        reply: Sender<Vec<MatchEvent>>,
    },
    Run(Job),
    Shutdown,
}

/// Owner of the worker thread.
#[derive(Debug)]
pub struct MatchWorker {
    handle: MatchHandle,
    join: JoinHandle<Match>,
}

/// Cloneable sender side of a [`MatchWorker`].
#[derive(Debug, Clone)]
pub struct MatchHandle {
    tx: Sender<Command>,
}

impl MatchWorker {
    /// Move `state` onto a new thread driven by `clock`.
    pub fn spawn<C: Clock + 'static>(state: Match, clock: C) -> Self {
        let (tx, rx) = mpsc::channel();
        let join = thread::spawn(move || worker_main(state, clock, rx));
        Self {
            handle: MatchHandle { tx },
            join,
        }
    }

    /// A handle for submitting commands.
    #[must_use]
    pub fn handle(&self) -> MatchHandle {
        self.handle.clone()
    }

    /// Stop the worker after the commands already queued and return the match.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the worker thread panicked.
    pub fn shutdown(self) -> Result<Match, WorkerError> {
        // A send failure means the thread is already gone; join reports why.
        let _ = self.handle.tx.send(Command::Shutdown);
        self.join.join().map_err(|_| WorkerError::Panicked)
    }
}

fn worker_main<C: Clock>(mut state: Match, clock: C, rx: Receiver<Command>) -> Match {
    info!(
        width = state.config().width,
        height = state.config().height,
        "match worker started"
    );
    loop {
        let command = match rx.recv_timeout(SPAWN_RETRY_INTERVAL) {
            Ok(command) => Some(command),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let now = clock.now();
        state.tick(now);

        let Some(command) = command else {
            continue;
        };
        if handle_command(&mut state, command, now) {
            break;
        }
    }
    debug!("match worker stopped");
    state
}

/// Apply one command. Returns `true` when the worker should stop.
fn handle_command(state: &mut Match, command: Command, now: SimTime) -> bool {
    // Reply failures mean the caller gave up waiting; the command still took effect.
    match command {
        Command::Join { id, name, reply } => {
            let _ = reply.send(state.join(id, name));
        }
        Command::BuildGrid { reply } => {
            let _ = reply.send(state.build_grid(now));
        }
        Command::EnsureSpawn { player } => state.ensure_spawn(player, now),
        Command::Submit { request, reply } => {
            let _ = reply.send(state.submit(request, now));
        }
        Command::DrainEvents { reply } => {
            let _ = reply.send(state.drain_events());
        }
        Command::Run(job) => job(state, now),
        Command::Shutdown => return true,
    }
    false
}

impl MatchHandle {
    fn send(&self, command: Command) -> Result<(), WorkerError> {
        self.tx.send(command).map_err(|_| WorkerError::Disconnected)
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T, WorkerError> {
        let (reply, response) = mpsc::channel();
        self.send(make(reply))?;
        response.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Register a player.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Disconnected`] if the worker is gone. The inner result carries
    /// the match's own answer.
    pub fn join(
        &self,
        id: PlayerId,
        name: impl Into<String>,
    ) -> Result<Result<(), MatchError>, WorkerError> {
        let name = name.into();
        self.request(|reply| Command::Join { id, name, reply })
    }

    /// Build the grid at the worker's current time.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Disconnected`] if the worker is gone.
    pub fn build_grid(&self) -> Result<Result<(), MatchError>, WorkerError> {
        self.request(|reply| Command::BuildGrid { reply })
    }

    /// Ask for a starting cell for `player`, retried in the background if needed.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Disconnected`] if the worker is gone.
    pub fn ensure_spawn(&self, player: PlayerId) -> Result<(), WorkerError> {
        self.send(Command::EnsureSpawn { player })
    }

    /// Submit a click and wait for its outcome.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Disconnected`] if the worker is gone.
    pub fn submit(&self, request: ActionRequest) -> Result<ActionOutcome, WorkerError> {
        self.request(|reply| Command::Submit { request, reply })
    }

    /// Take the events emitted since the last drain.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Disconnected`] if the worker is gone.
    pub fn drain_events(&self) -> Result<Vec<MatchEvent>, WorkerError> {
        self.request(|reply| Command::DrainEvents { reply })
    }

    /// Run `f` against the match on the worker thread and return its result.
    ///
    /// This is the hook for collaborators such as the economy that need direct access
    /// to player fields between actions.
    ///
    /// # Errors
    ///
    /// [`WorkerError::Disconnected`] if the worker is gone.
    pub fn with<T, F>(&self, f: F) -> Result<T, WorkerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Match, SimTime) -> T + Send + 'static,
    {
        self.request(|reply| {
            Command::Run(Box::new(move |state: &mut Match, now: SimTime| {
                let _ = reply.send(f(state, now));
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::game::ManualClock;

    #[test]
    fn test_handle_after_shutdown_is_disconnected() {
        let state = Match::new(MatchConfig::default()).unwrap();
        let worker = MatchWorker::spawn(state, ManualClock::new());
        let handle = worker.handle();
        worker.shutdown().unwrap();
        assert_eq!(handle.drain_events(), Err(WorkerError::Disconnected));
        assert_eq!(handle.ensure_spawn(1), Err(WorkerError::Disconnected));
    }

    #[test]
    fn test_with_sees_worker_time() {
        let clock = ManualClock::new();
        clock.set(SimTime::from_millis(750));
        let state = Match::new(MatchConfig::default()).unwrap();
        let worker = MatchWorker::spawn(state, clock);
        let now = worker.handle().with(|_, now| now).unwrap();
        assert_eq!(now, SimTime::from_millis(750));
        worker.shutdown().unwrap();
    }
}
