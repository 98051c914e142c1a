// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled task engine.
//!
//! Producers enqueue with [`schedule_message`] / [`schedule_status`]. A
//! [`Scheduler`] turns due tasks into channel sends one [`Scheduler::tick`]
//! at a time, and [`SchedulerRunner`] repeats ticks on an interval until
//! stopped. Tests call `tick` directly with a chosen `now`.

pub mod engine;
pub mod runner;
pub mod schedule;

pub use engine::{Delivery, Scheduler, TaskReport, TickOutcome};
pub use runner::{SchedulerHandle, SchedulerRunner};
pub use schedule::{schedule_message, schedule_status};
