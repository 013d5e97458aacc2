//! Rate desk for a medical-transport company.
//!
//! Prices ambulatory, wheelchair and stretcher trips against an editable rate
//! table, with a role-based user switcher and an audit trail.

pub mod access;
pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod pricing;
pub mod store;

pub use error::{AppError, Result};
