use std::{sync::Mutex, time::Duration};

use tokio::time::Instant;

/// Last accepted update. Both fields start unset and are always written together.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState {
    pub last_status: Option<bool>,
    pub last_accepted: Option<Instant>,
}

/// Drops a status update when it repeats the last accepted status within `window`.
///
/// State is local to this process. The lock only covers the compare-and-write,
/// never any I/O.
#[derive(Debug)]
pub struct DebounceGate {
    window: Duration,
    state: Mutex<DebounceState>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Mutex::new(DebounceState::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` and records `(status, now)` when the update should proceed.
    pub fn try_accept(&self, status: bool) -> bool {
        self.try_accept_at(status, Instant::now())
    }

    pub fn try_accept_at(&self, status: bool, now: Instant) -> bool {
        // The state is two plain fields, so a poisoned lock still holds a usable value.
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let repeated = state.last_status == Some(status);
        let recent = state
            .last_accepted
            .is_some_and(|at| now.saturating_duration_since(at) < self.window);
        if repeated && recent {
            return false;
        }

        state.last_status = Some(status);
        state.last_accepted = Some(now);
        true
    }

    pub fn snapshot(&self) -> DebounceState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(1);

    #[test]
    fn first_update_is_always_accepted() {
        let gate = DebounceGate::new(WINDOW);
        assert_eq!(gate.snapshot(), DebounceState::default());

        let now = Instant::now();
        assert!(gate.try_accept_at(false, now));
        assert_eq!(gate.snapshot().last_status, Some(false));
        assert_eq!(gate.snapshot().last_accepted, Some(now));
    }

    #[test]
    fn same_status_inside_window_is_dropped() {
        let gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.try_accept_at(true, t0));
        assert!(!gate.try_accept_at(true, t0 + Duration::from_millis(999)));
        // A rejected update must not move the window forward.
        assert_eq!(gate.snapshot().last_accepted, Some(t0));
    }

    #[test]
    fn same_status_at_or_after_window_passes() {
        let gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.try_accept_at(true, t0));
        assert!(gate.try_accept_at(true, t0 + WINDOW));
        assert!(!gate.try_accept_at(true, t0 + WINDOW + Duration::from_millis(10)));
    }

    #[test]
    fn status_change_always_passes() {
        let gate = DebounceGate::new(WINDOW);
        let t0 = Instant::now();

        assert!(gate.try_accept_at(true, t0));
        assert!(gate.try_accept_at(false, t0 + Duration::from_millis(1)));
        assert!(gate.try_accept_at(true, t0 + Duration::from_millis(2)));
        assert_eq!(gate.snapshot().last_status, Some(true));
    }

    #[test]
    fn zero_window_never_drops() {
        let gate = DebounceGate::new(Duration::ZERO);
        let t0 = Instant::now();

        assert!(gate.try_accept_at(true, t0));
        assert!(gate.try_accept_at(true, t0));
    }

    #[test]
    fn concurrent_callers_accept_exactly_once() {
        let gate = std::sync::Arc::new(DebounceGate::new(Duration::from_secs(60)));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || gate.try_accept_at(true, now))
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();

        assert_eq!(accepted, 1);
    }
}
