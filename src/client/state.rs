use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};

use crate::error::{ConnectionErrorKind, Error, Result};

/// Coarse connection state for display. `Connected` always means a live socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug)]
pub(crate) enum Outbound {
    Frame(String),
    Close,
}

/// The sending half of an open socket, tagged with the connection it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub(crate) id: u64,
    pub(crate) tx: mpsc::Sender<Outbound>,
}

/// Only the open phases own a [`Link`], so "ready without a socket" can't be expressed.
#[derive(Debug)]
enum Phase {
    Idle,
    Connecting(u64),
    SetupPending(Link),
    Ready(Link),
    Failed,
    Closed,
}

impl Phase {
    fn status(&self) -> ConnectionStatus {
        match self {
            Phase::Idle | Phase::Closed => ConnectionStatus::Disconnected,
            Phase::Connecting(_) => ConnectionStatus::Connecting,
            Phase::SetupPending(_) | Phase::Ready(_) => ConnectionStatus::Connected,
            Phase::Failed => ConnectionStatus::Error,
        }
    }

    fn link(&self) -> Option<&Link> {
        match self {
            Phase::SetupPending(link) | Phase::Ready(link) => Some(link),
            _ => None,
        }
    }
}

pub(crate) struct SessionState {
    phase: Mutex<Phase>,
    /// Held for every observer call, so callbacks never overlap and none follow `on_close`.
    dispatch: Mutex<()>,
    next_id: AtomicU64,
    status: watch::Sender<ConnectionStatus>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            phase: Mutex::new(Phase::Idle),
            dispatch: Mutex::new(()),
            next_id: AtomicU64::new(1),
            status,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serializes observer calls. Take it before any phase check that guards a callback.
    pub(crate) fn gate(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, phase: &mut Phase, next: Phase) {
        tracing::trace!(from = ?phase.status(), to = ?next.status(), "session phase change");
        *phase = next;
        self.status.send_replace(phase.status());
    }

    /// Claims the single connection slot, returning the id of the new attempt.
    pub(crate) fn begin_connect(&self) -> Result<u64> {
        let mut phase = self.lock();
        if matches!(*phase, Phase::Connecting(_) | Phase::SetupPending(_) | Phase::Ready(_)) {
            return Err(Error::connection(
                ConnectionErrorKind::AlreadyConnected,
                "already connected",
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.transition(&mut phase, Phase::Connecting(id));
        Ok(id)
    }

    /// The attempt `id` failed before the session opened. False if it had already been cancelled.
    pub(crate) fn fail(&self, id: u64) -> bool {
        let mut phase = self.lock();
        if !matches!(*phase, Phase::Connecting(current) if current == id) {
            return false;
        }
        self.transition(&mut phase, Phase::Failed);
        true
    }

    pub(crate) fn is_connecting(&self, id: u64) -> bool {
        matches!(*self.lock(), Phase::Connecting(current) if current == id)
    }

    /// Moves attempt `link.id` to `SetupPending`. False if it was cancelled meanwhile.
    pub(crate) fn open(&self, link: Link) -> bool {
        let mut phase = self.lock();
        if !matches!(*phase, Phase::Connecting(current) if current == link.id) {
            return false;
        }
        self.transition(&mut phase, Phase::SetupPending(link));
        true
    }

    pub(crate) fn mark_ready(&self, id: u64) -> bool {
        let mut phase = self.lock();
        let link = match &*phase {
            Phase::SetupPending(link) if link.id == id => link.clone(),
            _ => return false,
        };
        self.transition(&mut phase, Phase::Ready(link));
        true
    }

    /// The socket of connection `id` closed. False if that connection was already released.
    pub(crate) fn mark_closed(&self, id: u64, clean: bool) -> bool {
        let mut phase = self.lock();
        if !phase.link().is_some_and(|link| link.id == id) {
            return false;
        }
        self.transition(&mut phase, if clean { Phase::Closed } else { Phase::Failed });
        true
    }

    /// Releases whatever the client holds, returning the link if a socket was open.
    pub(crate) fn release(&self) -> Option<Link> {
        let mut phase = self.lock();
        let link = match &*phase {
            Phase::SetupPending(link) | Phase::Ready(link) => Some(link.clone()),
            Phase::Connecting(_) => None,
            Phase::Idle | Phase::Failed | Phase::Closed => return None,
        };
        self.transition(&mut phase, Phase::Closed);
        link
    }

    pub(crate) fn link(&self) -> Option<Link> {
        self.lock().link().cloned()
    }

    pub(crate) fn is_current(&self, id: u64) -> bool {
        self.lock().link().is_some_and(|link| link.id == id)
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(*self.lock(), Phase::Ready(_))
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: u64) -> (Link, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(1);
        (Link { id, tx }, rx)
    }

    #[test]
    fn single_connection_slot() {
        let state = SessionState::new();
        let id = state.begin_connect().unwrap();
        assert_eq!(state.status(), ConnectionStatus::Connecting);

        let err = state.begin_connect().unwrap_err();
        assert_eq!(err.code(), "ALREADY_CONNECTED");
        assert_eq!(state.status(), ConnectionStatus::Connecting);

        let (link, _rx) = link(id);
        assert!(state.open(link));
        assert_eq!(state.status(), ConnectionStatus::Connected);
        assert!(state.begin_connect().is_err());
        assert!(!state.is_ready());
        assert!(state.mark_ready(id));
        assert!(state.is_ready());
    }

    #[test]
    fn failed_attempt_frees_the_slot() {
        let state = SessionState::new();
        let id = state.begin_connect().unwrap();
        assert!(state.fail(id));
        assert_eq!(state.status(), ConnectionStatus::Error);
        assert!(state.link().is_none());
        assert!(state.begin_connect().is_ok());
    }

    #[test]
    fn cancelled_attempt_cannot_open() {
        let state = SessionState::new();
        let id = state.begin_connect().unwrap();
        assert!(state.is_connecting(id));
        assert!(state.release().is_none());
        assert!(!state.is_connecting(id));
        assert!(!state.fail(id));
        let (stale, _rx) = link(id);
        assert!(!state.open(stale));
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn stale_connection_cannot_touch_new_one() {
        let state = SessionState::new();
        let first = state.begin_connect().unwrap();
        let (l, _rx1) = link(first);
        assert!(state.open(l));
        assert!(state.release().is_some());

        let second = state.begin_connect().unwrap();
        let (l, _rx2) = link(second);
        assert!(state.open(l));

        assert!(!state.is_current(first));
        assert!(!state.mark_ready(first));
        assert!(!state.mark_closed(first, true));
        assert!(state.is_current(second));
        assert_eq!(state.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn unclean_close_reports_error() {
        let state = SessionState::new();
        let mut status = state.subscribe();
        let id = state.begin_connect().unwrap();
        let (l, _rx) = link(id);
        state.open(l);
        assert!(state.mark_closed(id, false));
        assert_eq!(*status.borrow_and_update(), ConnectionStatus::Error);
        assert!(state.link().is_none());
    }
}
