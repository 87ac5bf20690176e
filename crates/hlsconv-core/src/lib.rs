pub mod config;
pub mod logging;

pub mod batch;
pub mod control;
pub mod history;
pub mod import;
pub mod job;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod url_model;
