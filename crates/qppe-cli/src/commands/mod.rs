pub mod account;
pub mod config;
pub mod duration;
pub mod settings;
