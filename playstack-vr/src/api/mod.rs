//! HTTP handlers for playstack-vr

pub mod health;
pub mod instrumental;
pub mod ui;

pub use health::health_routes;
pub use ui::ui_routes;
