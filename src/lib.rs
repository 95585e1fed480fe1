// A small TODO list: server-rendered CRUD pages over SQLite, plus a terminal admin.

pub mod app;
pub mod config;
