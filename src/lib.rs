pub mod api_connection;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod model;
pub mod session;
pub mod shell;
pub mod storage;
