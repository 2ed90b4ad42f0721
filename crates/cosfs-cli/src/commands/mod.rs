pub mod check;
pub mod config;
pub mod files;
pub mod init;
pub mod refresh;
pub mod serve;
pub mod storages;
