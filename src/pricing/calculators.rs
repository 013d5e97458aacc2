//! Core rate calculation.
//!
//! Pure functions for trip pricing - no store access, no logging, no clock.
//! `calculate` is total: negative inputs are clamped to zero, missing table
//! entries price as zero and amounts saturate at `Decimal::MAX` rather than
//! overflow.

use std::collections::BTreeMap;

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::models::{RateSettings, RateTable, TripType};
use super::requests::{AddOns, Markup, MarkupKind, TripRequest};
use super::responses::{AddOnKind, Breakdown, BreakdownDetail};

pub const RAMP_FEE: Decimal = dec!(10);
pub const WAIT_TIME_HOURLY_RATE: Decimal = dec!(70);
pub const SECOND_DRIVER_FEE: Decimal = dec!(50);
pub const COMPANION_FEE: Decimal = dec!(25);
pub const ESCORT_HOURLY_RATE: Decimal = dec!(50);
pub const MEET_GREET_ORD_FEE: Decimal = dec!(50);
pub const MEET_GREET_OTHER_FEE: Decimal = dec!(70);
pub const STOP_OVER_FEE: Decimal = dec!(25);
pub const MULTI_DESTINATION_LEG_FEE: Decimal = dec!(35);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Only used for display; the engine itself never rounds to cents.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use medtrans_rates::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Round up to the next multiple of `step`. Exact multiples are unchanged.
pub fn round_up_to_multiple(amount: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return amount;
    }
    match amount.checked_div(step) {
        Some(steps) => steps.ceil().saturating_mul(step).normalize(),
        None => amount,
    }
}

/// Sum that saturates instead of overflowing
fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount))
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Billable trip miles before the round-trip multiplier.
///
/// Raises `miles` to the configured minimum, then rounds up to a whole mile,
/// or to the next ten when `round_mileage_to_ten` is set.
pub fn process_miles(miles: Decimal, settings: &RateSettings) -> Decimal {
    let floored = non_negative(miles).max(non_negative(settings.minimum_miles));
    if settings.round_mileage_to_ten {
        round_up_to_multiple(floored, dec!(10))
    } else {
        floored.ceil().normalize()
    }
}

/// Deadhead miles past the free allowance, times the multiplier
pub fn billable_deadhead(deadhead_miles: Decimal, free_miles: Decimal, factor: Decimal) -> Decimal {
    non_negative(non_negative(deadhead_miles) - non_negative(free_miles)).saturating_mul(factor)
}

/// Wait time bills a quarter hour under 30 minutes, then by the half hour
pub fn wait_time_cost(minutes: Decimal) -> Decimal {
    let minutes = non_negative(minutes);
    if minutes > Decimal::ZERO && minutes < dec!(30) {
        dec!(0.25) * WAIT_TIME_HOURLY_RATE
    } else {
        (minutes / dec!(30))
            .ceil()
            .saturating_mul(dec!(0.5) * WAIT_TIME_HOURLY_RATE)
    }
}

/// Meet & greet at O'Hare is cheaper than anywhere else
pub fn meet_greet_cost(airport: &str) -> Decimal {
    match airport.trim() {
        "" => Decimal::ZERO,
        "ORD" => MEET_GREET_ORD_FEE,
        _ => MEET_GREET_OTHER_FEE,
    }
}

/// Price every requested add-on. Only add-ons with a non-zero cost appear.
pub fn add_on_costs(add_ons: &AddOns, trip_multiplier: Decimal) -> BTreeMap<AddOnKind, Decimal> {
    let candidates = [
        (
            AddOnKind::RampFee,
            if add_ons.ramp_fee { RAMP_FEE } else { Decimal::ZERO },
        ),
        (AddOnKind::WaitTime, wait_time_cost(add_ons.wait_time_minutes)),
        (
            AddOnKind::SecondDriver,
            if add_ons.second_driver {
                SECOND_DRIVER_FEE
            } else {
                Decimal::ZERO
            },
        ),
        (
            AddOnKind::Companion,
            COMPANION_FEE
                .saturating_mul(Decimal::from(add_ons.companion_count))
                .saturating_mul(trip_multiplier),
        ),
        (
            AddOnKind::Escort,
            ESCORT_HOURLY_RATE.saturating_mul(non_negative(add_ons.escort_hours)),
        ),
        (
            AddOnKind::AirportMeetGreet,
            meet_greet_cost(&add_ons.airport_meet_greet),
        ),
        (
            AddOnKind::StopOver,
            STOP_OVER_FEE.saturating_mul(Decimal::from(add_ons.stop_over_count)),
        ),
        (
            AddOnKind::MultiDestination,
            MULTI_DESTINATION_LEG_FEE.saturating_mul(Decimal::from(add_ons.multi_destination_legs)),
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, cost)| *cost > Decimal::ZERO)
        .collect()
}

/// Markup on the (already floored) subtotal
pub fn markup_amount(markup: &Markup, subtotal: Decimal) -> Decimal {
    let value = non_negative(markup.value);
    match markup.kind {
        MarkupKind::None => Decimal::ZERO,
        MarkupKind::Dollar => value,
        MarkupKind::Percent => match subtotal.checked_mul(value) {
            Some(product) => product / dec!(100),
            None => (subtotal / dec!(100)).saturating_mul(value),
        },
    }
}

/// Price a trip against a rate table.
///
/// Steps, in order: resolve fare and mileage rate, apply the trip multiplier
/// and one-way fee, process miles, process deadhead, add-ons, minimum-fare
/// floor on the subtotal, markup, final rounding.
pub fn calculate(table: &RateTable, request: &TripRequest) -> Breakdown {
    let settings = &table.settings;
    let service = request.service_type;

    let base_fare = table.base_fare(request.rate_type, service);
    let mileage_rate = table.mileage_rate(request.rate_type, service);

    let trip_multiplier = request.trip_type.multiplier();
    let multiplier = Decimal::from(trip_multiplier);
    let one_way_rate = if request.trip_type == TripType::OneWay {
        table.one_way_rate(service)
    } else {
        Decimal::ZERO
    };
    let total_base_fare = base_fare.saturating_mul(multiplier).saturating_add(one_way_rate);

    let processed_miles = process_miles(request.miles, settings);
    let calculation_miles = processed_miles.saturating_mul(multiplier);
    let mileage_cost = calculation_miles.saturating_mul(mileage_rate);

    let deadhead_miles = billable_deadhead(
        request.deadhead_miles,
        settings.deadhead_free_miles,
        request.deadhead_multiplier.factor(),
    );
    let mut deadhead_cost = deadhead_miles.saturating_mul(table.deadhead_rate);
    if settings.round_deadhead_to_five {
        deadhead_cost = round_up_to_multiple(deadhead_cost, dec!(5));
    }

    let add_on_costs = add_on_costs(&request.add_ons, multiplier);
    let total_add_on_cost = saturating_sum(add_on_costs.values().copied());

    let minimum_fare = table.minimum_fare(service, request.rate_type, request.trip_type);
    let component_sum =
        saturating_sum([total_base_fare, mileage_cost, deadhead_cost, total_add_on_cost]);
    let minimum_fare_applied = component_sum < minimum_fare;
    let subtotal = if minimum_fare_applied {
        minimum_fare
    } else {
        component_sum
    };

    let markup_amount = markup_amount(&request.markup, subtotal);

    let before_rounding = subtotal.saturating_add(markup_amount);
    let total = if settings.round_total_to_five {
        round_up_to_multiple(before_rounding, dec!(5))
    } else {
        before_rounding
    };

    Breakdown {
        base_fare: total_base_fare,
        mileage_cost,
        deadhead_cost,
        add_on_costs,
        total_add_on_cost,
        markup_amount,
        subtotal,
        total,
        minimum_fare,
        minimum_fare_applied,
        breakdown: BreakdownDetail {
            original_miles: request.miles,
            processed_miles,
            calculation_miles,
            display_miles: processed_miles,
            deadhead_miles,
            trip_multiplier,
            deadhead_multiplier: request.deadhead_multiplier.value(),
            one_way_rate,
        },
    }
}
