pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod tracker;
pub mod view;
