//! Route handlers organized by report

pub mod health;
pub mod objectives;
pub mod order_reasons;
pub mod revenue;
pub mod salespeople;
