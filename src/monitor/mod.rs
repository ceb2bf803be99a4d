//! Club boost monitor.
//!
//! `ChangeMonitor` polls the club page on a fixed interval. Each tick first
//! checks whether the club's item changed on its own, then whether a boost
//! is open. An open boost raises the `CancellationSignal` before any further
//! network call and runs the `ContributionPipeline`. `MonitorService` owns
//! the worker thread.

mod change_loop;
mod collaborators;
mod config;
mod events;
mod handlers;
mod lifecycle;
mod pipeline;
mod signal;


pub use change_loop::ChangeMonitor;
pub use collaborators::Collaborators;
pub use config::LoopSettings;
pub use events::{ContributionOutcome, ContributionReport, TickOutcome};
pub use lifecycle::{MonitorService, StopOutcome};
pub use pipeline::ContributionPipeline;
pub use signal::CancellationSignal;
