pub mod agent;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod query;
pub mod routes;
pub mod service;
pub mod state;
pub mod validation;
