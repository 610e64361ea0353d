use std::sync::atomic::{AtomicBool, Ordering};

/// OS activity-lifecycle transitions relevant to render scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// The application is about to lose foreground activity
    WillResignActive,
    /// The application regained foreground activity
    DidBecomeActive,
}

/// Shared pause state for one view controller
///
/// Written from wherever the OS notifier runs, read by the render scheduler
/// before every tick. Atomics give eventual observation within one refresh
/// period without locking the render thread.
#[derive(Debug)]
pub struct PauseState {
    paused: AtomicBool,
    pause_on_will_resign_active: AtomicBool,
    resume_on_did_become_active: AtomicBool,
}

impl PauseState {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            pause_on_will_resign_active: AtomicBool::new(true),
            resume_on_did_become_active: AtomicBool::new(true),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn pause_on_will_resign_active(&self) -> bool {
        self.pause_on_will_resign_active.load(Ordering::Acquire)
    }

    pub fn set_pause_on_will_resign_active(&self, enabled: bool) {
        self.pause_on_will_resign_active
            .store(enabled, Ordering::Release);
    }

    pub fn resume_on_did_become_active(&self) -> bool {
        self.resume_on_did_become_active.load(Ordering::Acquire)
    }

    pub fn set_resume_on_did_become_active(&self, enabled: bool) {
        self.resume_on_did_become_active
            .store(enabled, Ordering::Release);
    }

    /// Map an activity transition onto the pause flag, honoring the two
    /// opt-in flags; disabled transitions leave the pause state untouched
    pub fn apply(&self, event: ActivityEvent) {
        match event {
            ActivityEvent::WillResignActive => {
                if self.pause_on_will_resign_active() {
                    log::debug!("resign-active: pausing render loop");
                    self.set_paused(true);
                }
            }
            ActivityEvent::DidBecomeActive => {
                if self.resume_on_did_become_active() {
                    log::debug!("become-active: resuming render loop");
                    self.set_paused(false);
                }
            }
        }
    }
}

impl Default for PauseState {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for removing an activity subscription
pub type SubscriptionId = u64;

/// Explicit subscription registry for activity notifications
///
/// The host registers a controller's callback at attach time and removes it at
/// detach, instead of the implicit protocol conformance the OS offers.
pub struct ActivityRouter {
    subscribers: Vec<(SubscriptionId, Box<dyn Fn(ActivityEvent) + Send>)>,
    next_id: SubscriptionId,
}

impl ActivityRouter {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(ActivityEvent) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns true when the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn post(&self, event: ActivityEvent) {
        for (_, callback) in &self.subscribers {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl Default for ActivityRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn pause_state_defaults() {
        let state = PauseState::new();
        assert!(!state.is_paused());
        assert!(state.pause_on_will_resign_active());
        assert!(state.resume_on_did_become_active());
    }

    #[test]
    fn apply_pauses_on_resign_when_enabled() {
        let state = PauseState::new();
        state.apply(ActivityEvent::WillResignActive);
        assert!(state.is_paused());

        state.apply(ActivityEvent::DidBecomeActive);
        assert!(!state.is_paused());
    }

    #[test]
    fn apply_ignores_resign_when_disabled() {
        let state = PauseState::new();
        state.set_pause_on_will_resign_active(false);
        state.apply(ActivityEvent::WillResignActive);
        assert!(!state.is_paused());
    }

    #[test]
    fn apply_ignores_become_active_when_disabled() {
        let state = PauseState::new();
        state.set_paused(true);
        state.set_resume_on_did_become_active(false);
        state.apply(ActivityEvent::DidBecomeActive);
        assert!(state.is_paused());
    }

    #[test]
    fn router_delivers_to_all_subscribers() {
        let mut router = ActivityRouter::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            router.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        router.post(ActivityEvent::WillResignActive);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn router_unsubscribe_removes_callback() {
        let mut router = ActivityRouter::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        let id = router.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(router.unsubscribe(id));
        assert!(!router.unsubscribe(id));
        assert!(router.is_empty());

        router.post(ActivityEvent::DidBecomeActive);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn router_ids_are_unique() {
        let mut router = ActivityRouter::new();
        let a = router.subscribe(|_| {});
        let b = router.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(router.len(), 2);
    }
}
