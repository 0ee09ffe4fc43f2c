pub mod app;
pub mod auth;
pub mod config;
pub mod egresos;
pub mod seed;
pub mod state;
pub mod stock;
pub mod storage;
pub mod uploads;
