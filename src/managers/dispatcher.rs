//! FIFO serialization queue for the engine.
//!
//! All mutations — session events and UI commands alike — go through one
//! queue drained by one worker thread that owns the [`Engine`]. Each unit
//! of work runs fully to completion, including all its provider and store
//! calls, before the next starts; that serialization is the only thing
//! protecting the whole-document read-modify-write cycle. A failed unit
//! is logged (or reported on its reply channel) and the worker moves on:
//! no retry, no dead-letter.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::warn;

use crate::app::Engine;
use crate::session::SessionProvider;
use crate::types::errors::EngineError;
use crate::types::events::SessionEvent;
use crate::types::records::{RecordKey, SessionId, StorageDocument, TabRecord};

type Reply<T> = Sender<Result<T, EngineError>>;

/// The closed set of units of work the queue carries. Events are
/// fire-and-forget; commands answer on a per-command reply channel.
pub enum Command {
    Event(SessionEvent),
    Reconcile(Reply<()>),
    OpenWindow {
        window: RecordKey,
        reply: Reply<SessionId>,
    },
    OpenGroup {
        window: RecordKey,
        group: RecordKey,
        reply: Reply<SessionId>,
    },
    OpenTab {
        window: RecordKey,
        group: RecordKey,
        tab: TabRecord,
        reply: Reply<SessionId>,
    },
    FocusedWindow(Reply<Option<SessionId>>),
    Snapshot(Reply<StorageDocument>),
    CloseGroup {
        group_id: SessionId,
        reply: Reply<()>,
    },
    DeleteWindow {
        window: RecordKey,
        reply: Reply<()>,
    },
    DeleteGroup {
        window: RecordKey,
        group: RecordKey,
        reply: Reply<()>,
    },
    DeleteTab {
        window: RecordKey,
        group: RecordKey,
        url: String,
        reply: Reply<()>,
    },
    SetWindowName {
        window: RecordKey,
        name: String,
        reply: Reply<()>,
    },
    DeleteClosedTabs {
        window: RecordKey,
        group: RecordKey,
        reply: Reply<()>,
    },
}

/// Handle used to enqueue work. Cloneable; all clones feed the same FIFO
/// queue, and the worker exits once every clone is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<Command>,
}

impl EngineHandle {
    /// Enqueues a session event without waiting for it to run.
    pub fn submit_event(&self, event: SessionEvent) -> Result<(), EngineError> {
        self.tx
            .send(Command::Event(event))
            .map_err(|_| EngineError::QueueClosed)
    }

    fn request<T, F>(&self, build: F) -> Result<T, EngineError>
    where
        F: FnOnce(Reply<T>) -> Command,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| EngineError::QueueClosed)?;
        reply_rx.recv().map_err(|_| EngineError::QueueClosed)?
    }

    pub fn reconcile(&self) -> Result<(), EngineError> {
        self.request(Command::Reconcile)
    }

    pub fn open_window(&self, window: &str) -> Result<SessionId, EngineError> {
        self.request(|reply| Command::OpenWindow {
            window: window.to_string(),
            reply,
        })
    }

    pub fn open_group(&self, window: &str, group: &str) -> Result<SessionId, EngineError> {
        self.request(|reply| Command::OpenGroup {
            window: window.to_string(),
            group: group.to_string(),
            reply,
        })
    }

    pub fn open_tab(
        &self,
        window: &str,
        group: &str,
        tab: TabRecord,
    ) -> Result<SessionId, EngineError> {
        self.request(|reply| Command::OpenTab {
            window: window.to_string(),
            group: group.to_string(),
            tab,
            reply,
        })
    }

    pub fn focused_window(&self) -> Result<Option<SessionId>, EngineError> {
        self.request(Command::FocusedWindow)
    }

    pub fn storage_snapshot(&self) -> Result<StorageDocument, EngineError> {
        self.request(Command::Snapshot)
    }

    pub fn close_group(&self, group_id: SessionId) -> Result<(), EngineError> {
        self.request(|reply| Command::CloseGroup { group_id, reply })
    }

    pub fn delete_window(&self, window: &str) -> Result<(), EngineError> {
        self.request(|reply| Command::DeleteWindow {
            window: window.to_string(),
            reply,
        })
    }

    pub fn delete_group(&self, window: &str, group: &str) -> Result<(), EngineError> {
        self.request(|reply| Command::DeleteGroup {
            window: window.to_string(),
            group: group.to_string(),
            reply,
        })
    }

    pub fn delete_tab(&self, window: &str, group: &str, url: &str) -> Result<(), EngineError> {
        self.request(|reply| Command::DeleteTab {
            window: window.to_string(),
            group: group.to_string(),
            url: url.to_string(),
            reply,
        })
    }

    pub fn set_window_name(&self, window: &str, name: &str) -> Result<(), EngineError> {
        self.request(|reply| Command::SetWindowName {
            window: window.to_string(),
            name: name.to_string(),
            reply,
        })
    }

    pub fn delete_closed_tabs(&self, window: &str, group: &str) -> Result<(), EngineError> {
        self.request(|reply| Command::DeleteClosedTabs {
            window: window.to_string(),
            group: group.to_string(),
            reply,
        })
    }
}

/// The queue worker. Owns the engine for the rest of the process.
pub struct Dispatcher {
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Moves the engine onto a worker thread and returns the handle used
    /// to feed it.
    pub fn spawn<P>(engine: Engine<P>) -> (EngineHandle, Dispatcher)
    where
        P: SessionProvider + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || Self::drain(engine, rx));
        (EngineHandle { tx }, Dispatcher { worker })
    }

    /// Waits for the worker to exit. It does so once every
    /// [`EngineHandle`] clone has been dropped and the queue is empty.
    pub fn join(self) {
        let _ = self.worker.join();
    }

    fn drain<P: SessionProvider>(mut engine: Engine<P>, rx: Receiver<Command>) {
        for command in rx {
            Self::run(&mut engine, command);
        }
    }

    fn run<P: SessionProvider>(engine: &mut Engine<P>, command: Command) {
        match command {
            Command::Event(event) => {
                if let Err(e) = engine.handle_event(&event) {
                    warn!("event handling failed: {}", e);
                }
            }
            Command::Reconcile(reply) => {
                let _ = reply.send(engine.full_reconcile());
            }
            Command::OpenWindow { window, reply } => {
                let _ = reply.send(engine.open_window(&window));
            }
            Command::OpenGroup {
                window,
                group,
                reply,
            } => {
                let _ = reply.send(engine.open_group(&window, &group));
            }
            Command::OpenTab {
                window,
                group,
                tab,
                reply,
            } => {
                let _ = reply.send(engine.open_tab(&window, &group, &tab));
            }
            Command::FocusedWindow(reply) => {
                let _ = reply.send(engine.focused_window());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(engine.storage_snapshot());
            }
            Command::CloseGroup { group_id, reply } => {
                let _ = reply.send(engine.close_group(group_id));
            }
            Command::DeleteWindow { window, reply } => {
                let _ = reply.send(engine.delete_window(&window));
            }
            Command::DeleteGroup {
                window,
                group,
                reply,
            } => {
                let _ = reply.send(engine.delete_group(&window, &group));
            }
            Command::DeleteTab {
                window,
                group,
                url,
                reply,
            } => {
                let _ = reply.send(engine.delete_tab(&window, &group, &url));
            }
            Command::SetWindowName {
                window,
                name,
                reply,
            } => {
                let _ = reply.send(engine.set_window_name(&window, &name));
            }
            Command::DeleteClosedTabs {
                window,
                group,
                reply,
            } => {
                let _ = reply.send(engine.delete_closed_tabs(&window, &group));
            }
        }
    }
}
