//! Common types for the hotelaria admin console session core

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
