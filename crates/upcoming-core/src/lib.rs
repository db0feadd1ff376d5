pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod platform;
pub mod widget;
