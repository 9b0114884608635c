// src/lib.rs
// New-pool discovery and rugpull risk scoring for Raydium (Solana) and,
// behind the `bsc` feature, PancakeSwap.

pub mod analyzers;
pub mod cache;
pub mod chains;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod scanners;
pub mod strategies;
pub mod telegram;
pub mod utils;
