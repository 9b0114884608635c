// src/strategies/mod.rs
pub mod buy_gate;
