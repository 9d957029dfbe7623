pub mod app;
pub mod auth;
pub mod canonical;
pub mod config;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod model_registry;
pub mod reencode;
pub mod transforms;
pub mod upstream;
pub mod wire;
