//! Gateway HTTP handlers

pub mod health;
pub mod transfer;

pub use health::health_check;
pub use transfer::transfer_funds;
