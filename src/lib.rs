//! Clipforged - media operations on top of ffmpeg and ffprobe
//!
//! This library crate exposes the configuration and operations service for
//! the binary and for integration testing.

pub mod config;
pub mod service;

pub use service::MediaService;
