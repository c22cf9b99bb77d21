#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod launcher;
pub mod logging;
pub mod naming;
pub mod plan;
pub mod storage;
