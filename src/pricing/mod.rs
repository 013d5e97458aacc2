//! Trip pricing for the rate desk.
//!
//! `calculators` holds the pure rate engine; `services` wraps it with
//! permission checks, the rate cache and the audit trail.

pub mod calculators;
pub mod models;
pub mod requests;
pub mod responses;
pub mod services;

// Re-export commonly used items
pub use calculators::{calculate, round_money};
pub use models::{MinimumFareKey, RateSchedule, RateSettings, RateTable, RateType, ServiceType, TripType};
pub use requests::{AddOns, DeadheadMultiplier, Markup, MarkupKind, TripRequest};
pub use responses::{quote_summary, AddOnKind, Breakdown, BreakdownDetail};
pub use services::RateService;
