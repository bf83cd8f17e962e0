pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod pages;
pub mod render;
pub mod services;
pub mod session;
