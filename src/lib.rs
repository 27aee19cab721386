pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod repo;
pub mod serving;
pub mod telemetry;
