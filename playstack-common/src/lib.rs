//! # PlayStack Common Library
//!
//! Shared code for the PlayStack web services:
//! - Configuration loading (TOML + environment)
//! - External tool invocation (`ToolRunner`)
//! - Input acquisition (URL download or upload) and form parsing
//! - Per-request job directories and the completed job store
//! - Stage reports for pipeline runs
//! - Shared page shell and stylesheet
//! - Human-readable durations

pub mod acquire;
pub mod config;
pub mod error;
pub mod form;
pub mod human_time;
pub mod jobs;
pub mod report;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
pub use tools::{SystemToolRunner, ToolError, ToolInvocation, ToolOutput, ToolRunner};
