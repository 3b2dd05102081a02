//! One open page: UI events in, rendered views out.

mod debounce;
mod session;
mod shortcuts;

pub use debounce::{Clock, Debouncer, TokioClock, SEARCH_DEBOUNCE};
pub use session::{Command, Reply, Session, UiEvent};
pub use shortcuts::{resolve, KeyChord, Shortcut, ShortcutAction, SHORTCUTS};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};

use crate::{progress::Notifications, view::View, Status};

/// Cloneable access to a running `Session`.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    views: watch::Receiver<View>,
}

impl SessionHandle {
    pub async fn send(&self, event: UiEvent) -> Result<Reply, Status> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Event(event, tx))
            .await
            .map_err(|_| Status::internal("Session is no longer running"))?;
        rx.await
            .map_err(|_| Status::internal("Session dropped the request"))
    }

    pub fn view(&self) -> View {
        self.views.borrow().clone()
    }

    /// Receiver notified with every re-render.
    pub fn views(&self) -> watch::Receiver<View> {
        self.views.clone()
    }

    /// Stops the session once in-flight progress writes completed.
    pub async fn shutdown(&self) -> Result<(), Status> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(tx))
            .await
            .map_err(|_| Status::internal("Session is no longer running"))?;
        rx.await
            .map_err(|_| Status::internal("Session stopped before flushing"))
    }
}

/// Spawns `session` on the runtime.
pub fn start<C: Clock + Send + 'static>(
    session: Session<C>,
    notifications: Notifications,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let handle = SessionHandle {
        commands: tx,
        views: session.subscribe(),
    };
    let task = tokio::spawn(session.run(rx, notifications));
    (handle, task)
}
