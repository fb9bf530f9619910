//! HTTP control server for a USB signal tower.
//!
//! The binary wires [`config::Config`] to a [`patlite_hardware::DeviceController`]
//! and exposes it through [`api::ApiServer`].

pub mod api;
pub mod config;

pub use api::ApiServer;
pub use config::Config;
