//! smartlock-hex: hexagonal storefront API library (application services,
//! inbound HTTP, outbound payment gateway)

pub mod config;
pub mod errors;

pub mod application;

pub use smartlock_types::{api, domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
pub mod outbound; // payment processor adapter
