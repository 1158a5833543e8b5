pub mod config;
pub mod error;
pub mod logging;

// Pipeline: catalog + job builder -> queue -> runner -> classify, driven by the controller.
pub mod catalog;
pub mod classify;
pub mod controller;
pub mod deps;
pub mod job;
pub mod queue;
pub mod reveal;
pub mod runner;
