//! HTTP layer: salvo routes, depot injection, and error mapping.

pub mod app;
pub mod clients;
pub mod config;
pub mod db_handler;
pub mod error;
