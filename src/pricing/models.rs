//! Rate table configuration and the trip vocabulary it is keyed by.
//!
//! The rate table is long-lived configuration owned by the store. The engine
//! only ever reads it. Entries missing from a stored document deserialize to
//! zero, and lookups for unrecognized services or rate types yield zero.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Level of care for a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum ServiceType {
    #[default]
    Ambulatory,
    Wheelchair,
    Stretcher,
    /// Anything not in the list above. Prices as zero.
    Unrecognized,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::Ambulatory,
        ServiceType::Wheelchair,
        ServiceType::Stretcher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Ambulatory => "ambulatory",
            ServiceType::Wheelchair => "wheelchair",
            ServiceType::Stretcher => "stretcher",
            ServiceType::Unrecognized => "unrecognized",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Ambulatory => "Ambulatory",
            ServiceType::Wheelchair => "Wheelchair",
            ServiceType::Stretcher => "Stretcher",
            ServiceType::Unrecognized => "Unrecognized",
        }
    }
}

impl From<&str> for ServiceType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "ambulatory" => ServiceType::Ambulatory,
            "wheelchair" => ServiceType::Wheelchair,
            "stretcher" => ServiceType::Stretcher,
            _ => ServiceType::Unrecognized,
        }
    }
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        ServiceType::from(value.as_str())
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored rate schedule (one column of the rate table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateSchedule {
    Regular,
    OffHours,
    Holiday,
}

impl RateSchedule {
    pub const ALL: [RateSchedule; 3] = [
        RateSchedule::Regular,
        RateSchedule::OffHours,
        RateSchedule::Holiday,
    ];

    /// Capitalized segment used inside minimum-fare keys
    pub fn key_segment(&self) -> &'static str {
        match self {
            RateSchedule::Regular => "Regular",
            RateSchedule::OffHours => "OffHours",
            RateSchedule::Holiday => "Holiday",
        }
    }
}

/// Rate type requested for a trip.
///
/// `RegularPlusOffHours` is derived: its base fare and mileage rate are the
/// sums of the regular and off-hours entries. It is never stored and has no
/// minimum fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RateType {
    #[default]
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "offHours")]
    OffHours,
    #[serde(rename = "holiday")]
    Holiday,
    #[serde(rename = "regular+offHours")]
    RegularPlusOffHours,
    #[serde(rename = "unrecognized")]
    Unrecognized,
}

impl RateType {
    /// Stored schedules whose entries are summed for this rate type
    pub fn schedules(&self) -> &'static [RateSchedule] {
        match self {
            RateType::Regular => &[RateSchedule::Regular],
            RateType::OffHours => &[RateSchedule::OffHours],
            RateType::Holiday => &[RateSchedule::Holiday],
            RateType::RegularPlusOffHours => &[RateSchedule::Regular, RateSchedule::OffHours],
            RateType::Unrecognized => &[],
        }
    }

    /// The single stored schedule backing this rate type, if any
    pub fn schedule(&self) -> Option<RateSchedule> {
        match self {
            RateType::Regular => Some(RateSchedule::Regular),
            RateType::OffHours => Some(RateSchedule::OffHours),
            RateType::Holiday => Some(RateSchedule::Holiday),
            RateType::RegularPlusOffHours | RateType::Unrecognized => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Regular => "regular",
            RateType::OffHours => "offHours",
            RateType::Holiday => "holiday",
            RateType::RegularPlusOffHours => "regular+offHours",
            RateType::Unrecognized => "unrecognized",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RateType::Regular => "Regular",
            RateType::OffHours => "Off Hours",
            RateType::Holiday => "Holiday",
            RateType::RegularPlusOffHours => "Regular + Off Hours",
            RateType::Unrecognized => "Unrecognized",
        }
    }
}

impl From<&str> for RateType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "regular" => RateType::Regular,
            "offHours" => RateType::OffHours,
            "holiday" => RateType::Holiday,
            "regular+offHours" => RateType::RegularPlusOffHours,
            _ => RateType::Unrecognized,
        }
    }
}

impl From<String> for RateType {
    fn from(value: String) -> Self {
        RateType::from(value.as_str())
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-way or round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
    Unrecognized,
}

impl TripType {
    pub const ALL: [TripType; 2] = [TripType::OneWay, TripType::RoundTrip];

    /// Legs billed for base fare and mileage
    pub fn multiplier(&self) -> u8 {
        match self {
            TripType::RoundTrip => 2,
            TripType::OneWay | TripType::Unrecognized => 1,
        }
    }

    /// Capitalized segment used inside minimum-fare keys
    pub fn key_segment(&self) -> Option<&'static str> {
        match self {
            TripType::OneWay => Some("OneWay"),
            TripType::RoundTrip => Some("RoundTrip"),
            TripType::Unrecognized => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "oneway",
            TripType::RoundTrip => "roundtrip",
            TripType::Unrecognized => "unrecognized",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TripType::OneWay => "One Way",
            TripType::RoundTrip => "Round Trip",
            TripType::Unrecognized => "Unrecognized",
        }
    }
}

impl From<&str> for TripType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "oneway" => TripType::OneWay,
            "roundtrip" => TripType::RoundTrip,
            _ => TripType::Unrecognized,
        }
    }
}

impl From<String> for TripType {
    fn from(value: String) -> Self {
        TripType::from(value.as_str())
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key into the minimum-fare table.
///
/// Serialized in the legacy concatenated form, e.g. `ambulatoryRegularOneWay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MinimumFareKey {
    pub service: ServiceType,
    pub schedule: RateSchedule,
    pub trip: TripType,
}

impl MinimumFareKey {
    /// Key for a trip, or `None` when the combination has no stored minimum
    /// (derived rate type or any unrecognized part).
    pub fn for_trip(service: ServiceType, rate: RateType, trip: TripType) -> Option<Self> {
        if service == ServiceType::Unrecognized || trip == TripType::Unrecognized {
            return None;
        }
        let schedule = rate.schedule()?;
        Some(Self {
            service,
            schedule,
            trip,
        })
    }
}

impl fmt::Display for MinimumFareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.service.as_str(),
            self.schedule.key_segment(),
            self.trip.key_segment().unwrap_or_default()
        )
    }
}

/// Error parsing a legacy minimum-fare key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown minimum fare key: {0}")]
pub struct ParseKeyError(pub String);

impl FromStr for MinimumFareKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseKeyError(s.to_string());

        let service = ServiceType::ALL
            .into_iter()
            .find(|service| s.starts_with(service.as_str()))
            .ok_or_else(err)?;
        let rest = &s[service.as_str().len()..];

        let schedule = RateSchedule::ALL
            .into_iter()
            .find(|schedule| rest.starts_with(schedule.key_segment()))
            .ok_or_else(err)?;
        let rest = &rest[schedule.key_segment().len()..];

        let trip = TripType::ALL
            .into_iter()
            .find(|trip| trip.key_segment() == Some(rest))
            .ok_or_else(err)?;

        Ok(Self {
            service,
            schedule,
            trip,
        })
    }
}

impl Serialize for MinimumFareKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MinimumFareKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Unknown keys in a stored minimum-fare table are dropped, not fatal
fn deserialize_minimum_fares<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<MinimumFareKey, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Decimal>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, amount)| match key.parse::<MinimumFareKey>() {
            Ok(parsed) => Some((parsed, amount)),
            Err(e) => {
                tracing::warn!("Dropping minimum fare entry: {}", e);
                None
            }
        })
        .collect())
}

/// One amount per service type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRates {
    pub ambulatory: Decimal,
    pub wheelchair: Decimal,
    pub stretcher: Decimal,
}

impl ServiceRates {
    pub fn new(ambulatory: Decimal, wheelchair: Decimal, stretcher: Decimal) -> Self {
        Self {
            ambulatory,
            wheelchair,
            stretcher,
        }
    }

    pub fn get(&self, service: ServiceType) -> Decimal {
        match service {
            ServiceType::Ambulatory => self.ambulatory,
            ServiceType::Wheelchair => self.wheelchair,
            ServiceType::Stretcher => self.stretcher,
            ServiceType::Unrecognized => Decimal::ZERO,
        }
    }

    pub fn set(&mut self, service: ServiceType, amount: Decimal) {
        match service {
            ServiceType::Ambulatory => self.ambulatory = amount,
            ServiceType::Wheelchair => self.wheelchair = amount,
            ServiceType::Stretcher => self.stretcher = amount,
            ServiceType::Unrecognized => {}
        }
    }
}

/// Service rates for each stored schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleRates {
    pub regular: ServiceRates,
    pub off_hours: ServiceRates,
    pub holiday: ServiceRates,
}

impl ScheduleRates {
    pub fn schedule(&self, schedule: RateSchedule) -> &ServiceRates {
        match schedule {
            RateSchedule::Regular => &self.regular,
            RateSchedule::OffHours => &self.off_hours,
            RateSchedule::Holiday => &self.holiday,
        }
    }

    pub fn schedule_mut(&mut self, schedule: RateSchedule) -> &mut ServiceRates {
        match schedule {
            RateSchedule::Regular => &mut self.regular,
            RateSchedule::OffHours => &mut self.off_hours,
            RateSchedule::Holiday => &mut self.holiday,
        }
    }

    /// Sum of the entries for every schedule behind `rate`
    pub fn resolve(&self, rate: RateType, service: ServiceType) -> Decimal {
        rate.schedules()
            .iter()
            .map(|schedule| self.schedule(*schedule).get(service))
            .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount))
    }
}

/// Rounding and threshold switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateSettings {
    pub round_mileage_to_ten: bool,
    pub round_total_to_five: bool,
    pub round_deadhead_to_five: bool,
    pub minimum_miles: Decimal,
    pub deadhead_free_miles: Decimal,
}

/// Complete pricing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    #[serde(default)]
    pub base_fares: ScheduleRates,
    #[serde(default)]
    pub mileage_rates: ScheduleRates,
    #[serde(default)]
    pub one_way_rates: ServiceRates,
    #[serde(default, deserialize_with = "deserialize_minimum_fares")]
    pub minimum_fares: BTreeMap<MinimumFareKey, Decimal>,
    #[serde(default)]
    pub deadhead_rate: Decimal,
    #[serde(default)]
    pub settings: RateSettings,
}

impl RateTable {
    /// A table with every amount zero and every switch off
    pub fn empty() -> Self {
        Self {
            base_fares: ScheduleRates::default(),
            mileage_rates: ScheduleRates::default(),
            one_way_rates: ServiceRates::default(),
            minimum_fares: BTreeMap::new(),
            deadhead_rate: Decimal::ZERO,
            settings: RateSettings::default(),
        }
    }

    pub fn base_fare(&self, rate: RateType, service: ServiceType) -> Decimal {
        self.base_fares.resolve(rate, service)
    }

    pub fn mileage_rate(&self, rate: RateType, service: ServiceType) -> Decimal {
        self.mileage_rates.resolve(rate, service)
    }

    pub fn one_way_rate(&self, service: ServiceType) -> Decimal {
        self.one_way_rates.get(service)
    }

    /// Minimum fare for a trip; zero when no key applies or none is configured
    pub fn minimum_fare(&self, service: ServiceType, rate: RateType, trip: TripType) -> Decimal {
        MinimumFareKey::for_trip(service, rate, trip)
            .and_then(|key| self.minimum_fares.get(&key).copied())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set_minimum_fare(&mut self, key: MinimumFareKey, amount: Decimal) {
        self.minimum_fares.insert(key, amount);
    }
}

impl Default for RateTable {
    /// Seed table. Regular rates match the desk's long-standing tariff.
    fn default() -> Self {
        let base_fares = ScheduleRates {
            regular: ServiceRates::new(dec!(25.00), dec!(30.00), dec!(45.00)),
            off_hours: ServiceRates::new(dec!(35.00), dec!(40.00), dec!(60.00)),
            holiday: ServiceRates::new(dec!(45.00), dec!(50.00), dec!(75.00)),
        };
        let mileage_rates = ScheduleRates {
            regular: ServiceRates::new(dec!(2.50), dec!(2.75), dec!(3.50)),
            off_hours: ServiceRates::new(dec!(3.00), dec!(3.25), dec!(4.00)),
            holiday: ServiceRates::new(dec!(3.50), dec!(3.75), dec!(4.50)),
        };

        // One-way minimum is the base fare plus $20, round trip doubles it
        let mut minimum_fares = BTreeMap::new();
        for schedule in RateSchedule::ALL {
            for service in ServiceType::ALL {
                let one_way = base_fares.schedule(schedule).get(service) + dec!(20);
                for trip in TripType::ALL {
                    let amount = one_way * Decimal::from(trip.multiplier());
                    minimum_fares.insert(
                        MinimumFareKey {
                            service,
                            schedule,
                            trip,
                        },
                        amount,
                    );
                }
            }
        }

        Self {
            base_fares,
            mileage_rates,
            one_way_rates: ServiceRates::new(dec!(10.00), dec!(15.00), dec!(25.00)),
            minimum_fares,
            deadhead_rate: dec!(1.25),
            settings: RateSettings {
                round_mileage_to_ten: true,
                round_total_to_five: false,
                round_deadhead_to_five: false,
                minimum_miles: dec!(5),
                deadhead_free_miles: Decimal::ZERO,
            },
        }
    }
}
