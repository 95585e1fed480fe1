pub mod admin;
pub mod error;
pub mod forms;
pub mod models;
pub mod server;
pub mod storage;
pub mod templates;
pub mod views;
