//! Logical time and cancellable deferred tasks.
//!
//! Nothing in the audit log reads ambient time or spawns timers: the
//! [`Clock`] is injected, and deferred work sits in a [`TimerQueue`] until
//! the owner polls it with the current time. Tests drive a
//! [`ManualClock`] and never sleep.

mod clock;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timer::{TimerId, TimerQueue};
