//! HTTP API handlers for playstack-ts

pub mod buildinfo;
pub mod health;
pub mod transcribe;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use transcribe::transcribe_routes;
pub use ui::ui_routes;
