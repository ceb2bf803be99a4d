//! Integration tests for the club monitor
//!
//! Drive `ChangeMonitor` and `MonitorService` through the public API with
//! in-memory collaborators.

mod fakes;
mod lifecycle;
mod scenarios;
