//! Producer event schema
//!
//! Wire shapes accepted from the telemetry producer (sensor simulator or
//! device driver), one JSON object per event:
//!
//! ```json
//! {"kind":"telemetry","telemetryType":0,"value":72.0,"timestamp":"2024-01-15T09:30:00"}
//! {"kind":"sleep","date":"2024-01-15","totalSleepMinutes":420,"deepSleepMinutes":84,
//!  "lightSleepMinutes":294,"awakeMinutes":42,"sleepQuality":85.0}
//! ```

use crate::error::TelemetryError;
use crate::types::SleepRecord;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Telemetry kinds, integer-coded in the server's order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TelemetryType {
    HeartRate,
    Steps,
    Distance,
    Calories,
    Weight,
    BloodPressure,
    BloodSugar,
    Temperature,
    Other,
}

impl TelemetryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryType::HeartRate => "heart_rate",
            TelemetryType::Steps => "steps",
            TelemetryType::Distance => "distance",
            TelemetryType::Calories => "calories",
            TelemetryType::Weight => "weight",
            TelemetryType::BloodPressure => "blood_pressure",
            TelemetryType::BloodSugar => "blood_sugar",
            TelemetryType::Temperature => "temperature",
            TelemetryType::Other => "other",
        }
    }
}

impl TryFrom<u8> for TelemetryType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => TelemetryType::HeartRate,
            1 => TelemetryType::Steps,
            2 => TelemetryType::Distance,
            3 => TelemetryType::Calories,
            4 => TelemetryType::Weight,
            5 => TelemetryType::BloodPressure,
            6 => TelemetryType::BloodSugar,
            7 => TelemetryType::Temperature,
            8 => TelemetryType::Other,
            _ => return Err(format!("unknown telemetry type code {code}")),
        })
    }
}

impl From<TelemetryType> for u8 {
    fn from(kind: TelemetryType) -> Self {
        kind as u8
    }
}

/// A single sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReading {
    pub telemetry_type: TelemetryType,
    pub value: f64,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Opaque producer metadata, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TelemetryReading {
    pub fn new(telemetry_type: TelemetryType, value: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            telemetry_type,
            value,
            timestamp,
            device_id: None,
            metadata: None,
        }
    }

    pub fn heart_rate(bpm: f64, timestamp: NaiveDateTime) -> Self {
        Self::new(TelemetryType::HeartRate, bpm, timestamp)
    }

    pub fn steps(steps: f64, timestamp: NaiveDateTime) -> Self {
        Self::new(TelemetryType::Steps, steps, timestamp)
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Values must be finite; range is up to the producer
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.value.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                telemetry_type: self.telemetry_type.as_str(),
                value: self.value,
            });
        }
        Ok(())
    }

    /// Step count carried by this reading; fractional steps are truncated
    pub fn step_count(&self) -> i64 {
        self.value as i64
    }
}

/// Sleep payload as sent by the producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepPayload {
    pub date: String,
    pub total_sleep_minutes: i64,
    pub deep_sleep_minutes: i64,
    #[serde(default)]
    pub light_sleep_minutes: i64,
    #[serde(default)]
    pub awake_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<f64>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
}

impl SleepPayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingSleepDate);
        }

        for (field, minutes) in [
            ("totalSleepMinutes", self.total_sleep_minutes),
            ("deepSleepMinutes", self.deep_sleep_minutes),
            ("lightSleepMinutes", self.light_sleep_minutes),
            ("awakeMinutes", self.awake_minutes),
        ] {
            if minutes < 0 {
                return Err(ValidationError::NegativeMinutes { field, minutes });
            }
        }

        if let Some(quality) = self.sleep_quality {
            if !(0.0..=100.0).contains(&quality) {
                return Err(ValidationError::QualityOutOfRange(quality));
            }
        }

        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return Err(ValidationError::EndBeforeStart { start, end });
            }
        }

        Ok(())
    }

    /// Validate and convert into a stored record
    pub fn into_record(self) -> Result<SleepRecord, ValidationError> {
        self.validate()?;
        Ok(SleepRecord {
            date: self.date,
            total_sleep_minutes: self.total_sleep_minutes,
            deep_sleep_minutes: self.deep_sleep_minutes,
            light_sleep_minutes: self.light_sleep_minutes,
            awake_minutes: self.awake_minutes,
            sleep_quality: self.sleep_quality,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

/// One line of a producer log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProducerEvent {
    Telemetry(TelemetryReading),
    Sleep(SleepPayload),
}

impl ProducerEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ProducerEvent::Telemetry(reading) => reading.validate(),
            ProducerEvent::Sleep(payload) => payload.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProducerEvent::Telemetry(_) => "telemetry",
            ProducerEvent::Sleep(_) => "sleep",
        }
    }
}

/// Validation errors for producer events
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{telemetry_type} value {value} is not a finite number")]
    NonFiniteValue {
        telemetry_type: &'static str,
        value: f64,
    },

    #[error("Sleep record has no date")]
    MissingSleepDate,

    #[error("{field} must not be negative, got {minutes}")]
    NegativeMinutes { field: &'static str, minutes: i64 },

    #[error("Sleep quality must be within 0-100, got {0}")]
    QualityOutOfRange(f64),

    #[error("Sleep ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Parse a producer timestamp.
///
/// Accepts naive ISO-8601 (`2024-01-15T09:30:00`, optional fraction, `T` or
/// space separator) as local wall-clock time, or RFC 3339 with an offset,
/// which is converted to local time.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TelemetryError> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| TelemetryError::InvalidTimestamp(raw.to_string()))
}

/// Serde adapter writing naive ISO-8601 and reading anything
/// [`parse_timestamp`] accepts
pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(deserialize_with = "super::deserialize")] NaiveDateTime);

            Ok(Option::<Wrapped>::deserialize(d)?.map(|Wrapped(ts)| ts))
        }
    }
}
