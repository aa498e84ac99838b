//! Producer log parsing
//!
//! Reads producer events from NDJSON or JSON-array input and reports which
//! lines fail validation.

use crate::error::TelemetryError;
use crate::schema::event::{ProducerEvent, ValidationError};

/// Reads producer events from serialized logs
pub struct ProducerLog;

impl ProducerLog {
    /// Parse a JSON string containing an array of events
    pub fn parse_array(json: &str) -> Result<Vec<ProducerEvent>, TelemetryError> {
        let events: Vec<ProducerEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (one event per line, blank lines ignored)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<ProducerEvent>, TelemetryError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event = serde_json::from_str::<ProducerEvent>(trimmed).map_err(|e| {
                TelemetryError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Validate each event, returning only the failures
    pub fn validate_events(events: &[ProducerEvent]) -> Vec<ValidationResult> {
        events
            .iter()
            .enumerate()
            .filter_map(|(index, event)| {
                event.validate().err().map(|error| ValidationResult {
                    index,
                    kind: event.kind(),
                    error,
                })
            })
            .collect()
    }
}

/// A failed event validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub kind: &'static str,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TelemetryType;

    const LOG: &str = r#"
{"kind":"telemetry","telemetryType":0,"value":72.0,"timestamp":"2024-01-15T09:30:00"}

{"kind":"telemetry","telemetryType":1,"value":5,"timestamp":"2024-01-15T09:31:00"}
{"kind":"sleep","date":"2024-01-15","totalSleepMinutes":420,"deepSleepMinutes":84,"sleepQuality":85.0}
"#;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let events = ProducerLog::parse_ndjson(LOG).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            ProducerEvent::Telemetry(r) if r.telemetry_type == TelemetryType::Steps
        ));
        assert_eq!(events[2].kind(), "sleep");
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let input = "{\"kind\":\"sleep\",\"date\":\"2024-01-15\",\"totalSleepMinutes\":1,\"deepSleepMinutes\":1}\nnot json\n";
        let err = ProducerLog::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[{"kind":"telemetry","telemetryType":3,"value":120.5,"timestamp":"2024-01-15T10:00:00"}]"#;
        let events = ProducerLog::parse_array(json).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_validate_events() {
        let json = r#"[
            {"kind":"sleep","date":"2024-01-15","totalSleepMinutes":420,"deepSleepMinutes":84},
            {"kind":"sleep","date":"2024-01-16","totalSleepMinutes":-5,"deepSleepMinutes":84}
        ]"#;
        let events = ProducerLog::parse_array(json).unwrap();
        let failures = ProducerLog::validate_events(&events);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].kind, "sleep");
    }
}
