//! Payment verification and checkout initiation against the Paystack API.

pub mod gateway;
pub mod handlers;
