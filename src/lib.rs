pub mod configuration;
pub mod db;
pub mod errors;
pub mod forms;
pub mod health;
pub mod helpers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod startup;
pub mod telemetry;
