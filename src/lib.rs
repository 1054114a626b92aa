pub mod api;
pub mod config;
pub mod core;
pub mod decoder;
pub mod executor;
pub mod judger;
pub mod problems;
pub mod redis_manager;
pub mod synth;
pub mod verifier;
