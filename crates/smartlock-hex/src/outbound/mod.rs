pub mod stripe;

pub use stripe::{DisabledGateway, StripeGateway};
