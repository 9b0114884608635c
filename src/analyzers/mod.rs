// src/analyzers/mod.rs
pub mod market_signals;
pub mod mint_account;
pub mod rugpull_checker;
