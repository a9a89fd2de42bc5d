pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod parser;
pub mod services;
pub mod storage;

#[cfg(test)]
mod testing;
