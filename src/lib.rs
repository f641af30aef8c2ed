// src/lib.rs

//! Divar listing notifier library

pub mod error;
pub mod handler;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
