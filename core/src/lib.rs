//! Sales-force compensation engine.
//!
//! Turns signed projects, monthly targets, marketing budgets and
//! performance scores into one auditable commission snapshot per
//! employee per month.

pub mod achievement_subsystem;
pub mod clock;
pub mod command;
pub mod commission_subsystem;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
mod intake;
pub mod marketing_subsystem;
pub mod project_subsystem;
pub mod rate_table;
pub mod store;
pub mod subsystem;
pub mod types;
