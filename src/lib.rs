#![doc = "The `taskloop` library crate."]
#![doc = ""]
#![doc = "This crate contains the core business logic, domain models, authentication"]
#![doc = "mechanisms, routing configuration, and error handling for the Taskloop backend:"]
#![doc = "per-user task CRUD with recurring-task generation, plus an email-verified"]
#![doc = "registration flow. It is used by the main binary (`main.rs`) to construct and"]
#![doc = "run the application."]

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod routes;
pub mod verification;
