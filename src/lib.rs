//! Zabbix to JSM Ops alert adapter
//!
//! Receives one monitoring event as a flat parameter map, decides which alert
//! lifecycle operation it stands for and performs it against the Jira Service
//! Management Operations integration API.

pub mod classifier;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod poller;
pub mod tags;
pub mod transport;

pub use classifier::{classify, Operation};
pub use config::AdapterConfig;
pub use error::{AppError, Result};
pub use lifecycle::{process_event, AlertLifecycle, Plan};
pub use models::{EventContext, OperationResult};
