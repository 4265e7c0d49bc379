//! Power-management seam used by the fold policies.
//!
//! The fold state machine never powers panels on its own authority: it asks
//! the power manager whether the screen is lit, whether an in-progress
//! screen-off can still be cancelled (ambient-display scene), and to wake
//! the device when unfolding a dark phone.

pub mod simulated;

pub use simulated::SimulatedPowerManager;

#[cfg_attr(test, mockall::automock)]
pub trait PowerManager: Send + Sync {
    /// Whether the device screen is currently on.
    fn is_screen_on(&self) -> bool;

    /// Whether the panel used in the folded state is currently on.
    fn is_fold_screen_on(&self) -> bool;

    /// Tries to abort a screen-off that has not completed yet.  Returns
    /// `true` when the screen stays on.
    fn try_cancel_screen_off(&self) -> bool;

    /// Skips the screen-off animation for the next power-off.
    fn force_skip_screen_off_animation(&self);

    /// Wakes the device without blocking the caller.
    fn wakeup_device_async(&self);

    /// Resets the user-activity timer.
    fn refresh_activity(&self);

    fn set_keyguard_drawn_done(&self, done: bool);
}
