pub mod config;
pub mod pattern;
pub mod store;
pub mod time_signature;
pub mod transport;
pub mod voice;
