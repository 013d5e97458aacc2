//! Response DTOs and text rendering for quotes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::round_money;
use super::models::ServiceType;
use super::requests::{MarkupKind, TripRequest};

/// Add-on line items, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AddOnKind {
    RampFee,
    WaitTime,
    SecondDriver,
    Companion,
    Escort,
    AirportMeetGreet,
    StopOver,
    MultiDestination,
}

impl AddOnKind {
    pub fn label(&self) -> &'static str {
        match self {
            AddOnKind::RampFee => "Ramp Fee",
            AddOnKind::WaitTime => "Wait Time",
            AddOnKind::SecondDriver => "Second Driver",
            AddOnKind::Companion => "Companions",
            AddOnKind::Escort => "Escort",
            AddOnKind::AirportMeetGreet => "Airport Meet & Greet",
            AddOnKind::StopOver => "Stop Overs",
            AddOnKind::MultiDestination => "Multi-Destination Legs",
        }
    }
}

/// Itemized price for one trip.
///
/// Component amounts are reported as computed. When the minimum fare applies
/// only `subtotal` is raised, so the components may sum to less than it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub base_fare: Decimal,
    pub mileage_cost: Decimal,
    pub deadhead_cost: Decimal,
    pub add_on_costs: BTreeMap<AddOnKind, Decimal>,
    pub total_add_on_cost: Decimal,
    pub markup_amount: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub minimum_fare: Decimal,
    pub minimum_fare_applied: bool,
    pub breakdown: BreakdownDetail,
}

/// Mileage and multiplier detail behind a breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownDetail {
    pub original_miles: Decimal,
    pub processed_miles: Decimal,
    pub calculation_miles: Decimal,
    pub display_miles: Decimal,
    /// Billable deadhead after free miles and multiplier
    pub deadhead_miles: Decimal,
    pub trip_multiplier: u8,
    pub deadhead_multiplier: u8,
    pub one_way_rate: Decimal,
}

/// Dashboard summary of the regular schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOverview {
    pub base_fare_min: Decimal,
    pub base_fare_max: Decimal,
    pub mileage_rate_min: Decimal,
    pub mileage_rate_max: Decimal,
    pub deadhead_rate: Decimal,
}

/// Worked example for one service on the settings screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePreview {
    pub service_type: ServiceType,
    pub miles: Decimal,
    pub deadhead_miles: Decimal,
    pub base_fare: Decimal,
    pub mileage_cost: Decimal,
    pub deadhead_cost: Decimal,
    pub total: Decimal,
}

/// Format an amount as dollars with two decimals
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", round_money(amount, 2))
}

/// Plain-text quote suitable for pasting into a dispatch note
pub fn quote_summary(request: &TripRequest, breakdown: &Breakdown) -> String {
    let detail = &breakdown.breakdown;
    let mut out = String::new();

    let _ = writeln!(out, "Rainbow Road Transport - Rate Calculation");
    let _ = writeln!(out, "Service Type: {}", request.service_type.label());
    let _ = writeln!(out, "Rate Type: {}", request.rate_type.label());
    let _ = writeln!(out, "Trip Type: {}", request.trip_type.label());
    let _ = writeln!(out, "Miles: {}", detail.display_miles);
    let _ = writeln!(
        out,
        "Deadhead Miles: {} (x{})",
        request.deadhead_miles.normalize(),
        detail.deadhead_multiplier
    );
    let _ = writeln!(out, "Base Fare: {}", format_money(breakdown.base_fare));
    let _ = writeln!(out, "Mileage Cost: {}", format_money(breakdown.mileage_cost));
    let _ = writeln!(out, "Deadhead Cost: {}", format_money(breakdown.deadhead_cost));

    for (kind, amount) in &breakdown.add_on_costs {
        let _ = writeln!(out, "{}: {}", kind.label(), format_money(*amount));
    }

    match request.markup.kind {
        MarkupKind::None => {}
        MarkupKind::Dollar => {
            let _ = writeln!(out, "Markup: {}", format_money(breakdown.markup_amount));
        }
        MarkupKind::Percent => {
            let _ = writeln!(
                out,
                "Markup ({}%): {}",
                request.markup.value.normalize(),
                format_money(breakdown.markup_amount)
            );
        }
    }

    if breakdown.minimum_fare_applied {
        let _ = writeln!(out, "Minimum Fare Applied: {}", format_money(breakdown.minimum_fare));
    }

    let _ = write!(out, "Total: {}", format_money(breakdown.total));
    out
}
