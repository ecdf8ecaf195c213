mod basic;
mod client;

pub use basic::BasicClient;
pub use client::{HttpClient, RawResponse, TransportError};
