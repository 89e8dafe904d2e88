//! smartlock-types: storefront domain model, API payloads and ports shared by
//! the service, the storage adapters and the HTTP client.

pub mod api;
pub mod domain;
pub mod ports;
