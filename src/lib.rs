pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod rules;

// Domain data shapes shared across stages
pub mod domain;
