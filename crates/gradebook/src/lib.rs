//! `gradebook` - A student record service with letter-grade classification
//!
//! This library provides the grade classifier, the record store gateway, the
//! `SQLite` storage backing it, and the HTTP API that exposes it.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod grade;
pub mod logging;
pub mod storage;
pub mod student;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{Gateway, StudentStore};
pub use grade::{classify, Letter, Score};
pub use logging::init_logging;
pub use storage::{SharedStorage, Storage, StorageStats};
pub use student::{NewStudent, Scores, StudentId, StudentPayload, StudentRecord};
