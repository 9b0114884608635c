// src/scanners/mod.rs
pub mod creation_time;
pub mod monitor;
pub mod new_pools;
pub mod pool_filter;
