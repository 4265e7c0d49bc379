//! Power manager backed by in-memory flags.
//!
//! Used by the service binary when no platform power service is available
//! and by integration tests that need to flip the screen state between
//! fold transitions.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::PowerManager;

pub struct SimulatedPowerManager {
    screen_on: AtomicBool,
    fold_screen_on: AtomicBool,
    screen_off_cancellable: AtomicBool,
    keyguard_drawn: AtomicBool,
    wakeups: AtomicU32,
    activity_refreshes: AtomicU32,
    skipped_animations: AtomicU32,
}

impl SimulatedPowerManager {
    /// A device whose screen is on.
    pub fn new() -> Self {
        Self {
            screen_on: AtomicBool::new(true),
            fold_screen_on: AtomicBool::new(true),
            screen_off_cancellable: AtomicBool::new(false),
            keyguard_drawn: AtomicBool::new(true),
            wakeups: AtomicU32::new(0),
            activity_refreshes: AtomicU32::new(0),
            skipped_animations: AtomicU32::new(0),
        }
    }

    /// Turns the whole device screen on or off.
    pub fn set_screen_on(&self, on: bool) {
        self.screen_on.store(on, Ordering::SeqCst);
        self.fold_screen_on.store(on, Ordering::SeqCst);
    }

    /// Makes the next [`PowerManager::try_cancel_screen_off`] succeed, as in
    /// an ambient-display scene.
    pub fn set_screen_off_cancellable(&self, cancellable: bool) {
        self.screen_off_cancellable.store(cancellable, Ordering::SeqCst);
    }

    pub fn wakeup_count(&self) -> u32 {
        self.wakeups.load(Ordering::SeqCst)
    }

    pub fn activity_refresh_count(&self) -> u32 {
        self.activity_refreshes.load(Ordering::SeqCst)
    }

    pub fn skipped_animation_count(&self) -> u32 {
        self.skipped_animations.load(Ordering::SeqCst)
    }

    pub fn keyguard_drawn_done(&self) -> bool {
        self.keyguard_drawn.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedPowerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerManager for SimulatedPowerManager {
    fn is_screen_on(&self) -> bool {
        self.screen_on.load(Ordering::SeqCst)
    }

    fn is_fold_screen_on(&self) -> bool {
        self.fold_screen_on.load(Ordering::SeqCst)
    }

    fn try_cancel_screen_off(&self) -> bool {
        if self.screen_off_cancellable.swap(false, Ordering::SeqCst) {
            self.set_screen_on(true);
            return true;
        }
        false
    }

    fn force_skip_screen_off_animation(&self) {
        self.skipped_animations.fetch_add(1, Ordering::SeqCst);
    }

    fn wakeup_device_async(&self) {
        self.wakeups.fetch_add(1, Ordering::SeqCst);
        self.set_screen_on(true);
    }

    fn refresh_activity(&self) {
        self.activity_refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn set_keyguard_drawn_done(&self, done: bool) {
        self.keyguard_drawn.store(done, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_screen_off_is_one_shot() {
        let power = SimulatedPowerManager::new();
        power.set_screen_on(false);
        power.set_screen_off_cancellable(true);

        assert!(power.try_cancel_screen_off());
        assert!(power.is_screen_on());
        assert!(!power.try_cancel_screen_off());
    }

    #[test]
    fn test_wakeup_turns_screen_on() {
        let power = SimulatedPowerManager::new();
        power.set_screen_on(false);
        power.wakeup_device_async();
        assert!(power.is_screen_on());
        assert_eq!(power.wakeup_count(), 1);
    }
}
