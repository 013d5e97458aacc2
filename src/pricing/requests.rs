//! Trip request DTOs.
//!
//! Fields are coerced rather than validated: numbers, numeric strings,
//! `null` and missing values are all accepted, and anything unparseable
//! becomes zero, false or the field's default. Only malformed JSON is
//! rejected.

use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::models::{RateType, ServiceType, TripType};
use crate::error::{AppError, Result as AppResult};

/// Everything the engine needs to price one trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    #[serde(default, deserialize_with = "lenient_label")]
    pub service_type: ServiceType,
    #[serde(default, deserialize_with = "lenient_label")]
    pub rate_type: RateType,
    #[serde(default, deserialize_with = "lenient_label")]
    pub trip_type: TripType,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub miles: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub deadhead_miles: Decimal,
    #[serde(default)]
    pub deadhead_multiplier: DeadheadMultiplier,
    #[serde(default, deserialize_with = "lenient_object")]
    pub add_ons: AddOns,
    #[serde(default, deserialize_with = "lenient_object")]
    pub markup: Markup,
}

impl TripRequest {
    pub fn new(
        service_type: ServiceType,
        rate_type: RateType,
        trip_type: TripType,
        miles: Decimal,
    ) -> Self {
        Self {
            service_type,
            rate_type,
            trip_type,
            miles,
            ..Self::default()
        }
    }

    /// Decode a request as submitted by the booking form
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|e| AppError::InvalidRequest(e.to_string()))
    }
}

/// Deadhead mileage multiplier. Only 1, 2 and 4 are offered; anything else
/// bills as 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeadheadMultiplier {
    #[default]
    Single,
    Double,
    Quadruple,
}

impl DeadheadMultiplier {
    pub fn value(&self) -> u8 {
        match self {
            DeadheadMultiplier::Single => 1,
            DeadheadMultiplier::Double => 2,
            DeadheadMultiplier::Quadruple => 4,
        }
    }

    pub fn factor(&self) -> Decimal {
        Decimal::from(self.value())
    }
}

impl From<Decimal> for DeadheadMultiplier {
    fn from(value: Decimal) -> Self {
        if value == Decimal::from(2) {
            DeadheadMultiplier::Double
        } else if value == Decimal::from(4) {
            DeadheadMultiplier::Quadruple
        } else {
            DeadheadMultiplier::Single
        }
    }
}

impl Serialize for DeadheadMultiplier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for DeadheadMultiplier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_decimal(deserializer).map(DeadheadMultiplier::from)
    }
}

/// Optional extras billed on top of the fare
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddOns {
    #[serde(deserialize_with = "lenient_flag")]
    pub ramp_fee: bool,
    #[serde(deserialize_with = "lenient_decimal")]
    pub wait_time_minutes: Decimal,
    #[serde(deserialize_with = "lenient_flag")]
    pub second_driver: bool,
    #[serde(deserialize_with = "lenient_count")]
    pub companion_count: u32,
    #[serde(deserialize_with = "lenient_decimal")]
    pub escort_hours: Decimal,
    /// Airport code for meet & greet ("ORD", "MDW"); empty when not requested
    #[serde(deserialize_with = "lenient_text")]
    pub airport_meet_greet: String,
    #[serde(deserialize_with = "lenient_count")]
    pub stop_over_count: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub multi_destination_legs: u32,
}

/// How markup is applied to the subtotal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MarkupKind {
    #[default]
    None,
    Dollar,
    Percent,
}

impl From<&str> for MarkupKind {
    fn from(value: &str) -> Self {
        match value.trim() {
            "dollar" => MarkupKind::Dollar,
            "percent" => MarkupKind::Percent,
            _ => MarkupKind::None,
        }
    }
}

impl From<String> for MarkupKind {
    fn from(value: String) -> Self {
        MarkupKind::from(value.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    #[serde(rename = "type", default, deserialize_with = "lenient_label")]
    pub kind: MarkupKind,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub value: Decimal,
}

impl Markup {
    pub fn dollar(value: Decimal) -> Self {
        Self {
            kind: MarkupKind::Dollar,
            value,
        }
    }

    pub fn percent(value: Decimal) -> Self {
        Self {
            kind: MarkupKind::Percent,
            value,
        }
    }
}

/// Coerce a JSON scalar into a decimal, falling back to zero
pub fn coerce_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

/// Whole count from a decimal; truncates toward zero, negatives count as none
pub fn to_count(value: Decimal) -> u32 {
    value.trunc().to_u32().unwrap_or(0)
}

/// Parse free-form count text
pub fn parse_count(raw: &str) -> u32 {
    to_count(parse_decimal(raw))
}

/// Parse free-form numeric text, falling back to zero
pub fn parse_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_decimal(&value))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(to_count(coerce_decimal(&value)))
}

/// Checkbox values: booleans, "true"/"yes"/"on"/"1" and non-zero numbers
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "on" | "1"
        ),
        Value::Number(n) => !parse_decimal(&n.to_string()).is_zero(),
        _ => false,
    };
    Ok(flag)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    };
    Ok(text)
}

/// Selector values; `null` means the default, other scalars are unrecognized
fn lenient_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String> + Default,
{
    let label = match Value::deserialize(deserializer)? {
        Value::Null => T::default(),
        Value::String(s) => T::from(s),
        other => T::from(other.to_string()),
    };
    Ok(label)
}

/// Nested groups; anything but an object falls back to the defaults
fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minimal_request_uses_defaults() {
        let request: TripRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.service_type, ServiceType::Ambulatory);
        assert_eq!(request.rate_type, RateType::Regular);
        assert_eq!(request.trip_type, TripType::OneWay);
        assert_eq!(request.miles, dec!(0));
        assert_eq!(request.deadhead_multiplier, DeadheadMultiplier::Single);
        assert_eq!(request.markup.kind, MarkupKind::None);
    }

    #[test]
    fn test_numeric_fields_accept_strings_and_garbage() {
        let json = r#"{
            "serviceType": "wheelchair",
            "rateType": "regular+offHours",
            "tripType": "roundtrip",
            "miles": "12.5",
            "deadheadMiles": "abc",
            "deadheadMultiplier": "4",
            "addOns": {
                "waitTimeMinutes": null,
                "companionCount": "2",
                "escortHours": 1.5,
                "stopOverCount": -3,
                "multiDestinationLegs": 2.9,
                "airportMeetGreet": "MDW",
                "rampFee": true
            },
            "markup": {"type": "percent", "value": "10"}
        }"#;
        let request: TripRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.service_type, ServiceType::Wheelchair);
        assert_eq!(request.rate_type, RateType::RegularPlusOffHours);
        assert_eq!(request.trip_type, TripType::RoundTrip);
        assert_eq!(request.miles, dec!(12.5));
        assert_eq!(request.deadhead_miles, dec!(0));
        assert_eq!(request.deadhead_multiplier, DeadheadMultiplier::Quadruple);
        assert_eq!(request.add_ons.wait_time_minutes, dec!(0));
        assert_eq!(request.add_ons.companion_count, 2);
        assert_eq!(request.add_ons.escort_hours, dec!(1.5));
        assert_eq!(request.add_ons.stop_over_count, 0);
        assert_eq!(request.add_ons.multi_destination_legs, 2);
        assert_eq!(request.add_ons.airport_meet_greet, "MDW");
        assert!(request.add_ons.ramp_fee);
        assert_eq!(request.markup, Markup::percent(dec!(10)));
    }

    #[test]
    fn test_unsupported_multiplier_bills_single() {
        let request: TripRequest = serde_json::from_str(r#"{"deadheadMultiplier": 3}"#).unwrap();
        assert_eq!(request.deadhead_multiplier, DeadheadMultiplier::Single);

        let request: TripRequest = serde_json::from_str(r#"{"deadheadMultiplier": 2}"#).unwrap();
        assert_eq!(request.deadhead_multiplier.factor(), dec!(2));
    }

    #[test]
    fn test_unknown_markup_type_means_none() {
        let request: TripRequest =
            serde_json::from_str(r#"{"markup": {"type": "bonus", "value": 5}}"#).unwrap();
        assert_eq!(request.markup.kind, MarkupKind::None);
        assert_eq!(request.markup.value, dec!(5));
    }

    #[test]
    fn test_flags_and_selectors_are_lenient() {
        let json = r#"{
            "serviceType": null,
            "rateType": 7,
            "tripType": "roundtrip",
            "addOns": {
                "rampFee": "true",
                "secondDriver": 0,
                "airportMeetGreet": null
            },
            "markup": {"type": null, "value": "5"}
        }"#;
        let request = TripRequest::from_json(json).unwrap();

        assert_eq!(request.service_type, ServiceType::Ambulatory);
        assert_eq!(request.rate_type, RateType::Unrecognized);
        assert_eq!(request.trip_type, TripType::RoundTrip);
        assert!(request.add_ons.ramp_fee);
        assert!(!request.add_ons.second_driver);
        assert_eq!(request.add_ons.airport_meet_greet, "");
        assert_eq!(request.markup.kind, MarkupKind::None);
        assert_eq!(request.markup.value, dec!(5));

        let request =
            TripRequest::from_json(r#"{"addOns": null, "markup": "10%", "miles": 4}"#).unwrap();
        assert_eq!(request.add_ons, AddOns::default());
        assert_eq!(request.markup, Markup::default());
        assert_eq!(request.miles, dec!(4));
    }

    #[test]
    fn test_malformed_json_is_an_invalid_request() {
        let err = TripRequest::from_json("{\"miles\": ").unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(TripRequest::from_json("\"ambulatory\"").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), 3);
        assert_eq!(parse_count("2.9"), 2);
        assert_eq!(parse_count("-1"), 0);
        assert_eq!(parse_count("many"), 0);
    }

    #[test]
    fn test_parse_decimal_fallbacks() {
        assert_eq!(parse_decimal(" 7.25 "), dec!(7.25));
        assert_eq!(parse_decimal("1e2"), dec!(100));
        assert_eq!(parse_decimal(""), dec!(0));
        assert_eq!(parse_decimal("twelve"), dec!(0));
    }
}
