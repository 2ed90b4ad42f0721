pub mod config;
pub mod error;
pub mod keygen;
pub mod types;
