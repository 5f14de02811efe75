pub mod api_types;
pub mod client;
pub mod preview;
pub mod transport;
pub mod types;
