pub mod kv;
pub mod library;
pub mod settings;
