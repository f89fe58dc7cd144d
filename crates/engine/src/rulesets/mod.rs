//! Rulesets compiled into the engine.

pub mod fivee_stock;

pub use fivee_stock::FiveEStockModule;
