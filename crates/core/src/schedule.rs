//! Date/time/room triples used by defense proposals and final schedules.
//!
//! Times travel as `HH:MM` on the wire; a trailing `:SS` is accepted on
//! input and dropped.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// A defense slot: calendar date, start time and room label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    #[serde(with = "hm_time")]
    pub time: NaiveTime,
    pub room: String,
}

impl Slot {
    /// Build a slot, rejecting a blank room.
    pub fn new(date: NaiveDate, time: NaiveTime, room: &str) -> Result<Self, CoreError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(CoreError::field("room", "room is required"));
        }
        Ok(Self {
            date,
            time,
            room: room.to_string(),
        })
    }

    /// Same date, same start time and same room (room compared
    /// case-insensitively).
    pub fn collides_with(&self, other: &Slot) -> bool {
        self.date == other.date
            && self.time == other.time
            && self.room.eq_ignore_ascii_case(&other.room)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        CoreError::field("date", format!("Invalid date '{value}'. Expected YYYY-MM-DD"))
    })
}

pub fn parse_time(value: &str) -> Result<NaiveTime, CoreError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| CoreError::field("time", format!("Invalid time '{value}'. Expected HH:MM")))
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// `#[serde(with = "hm_time")]` for `NaiveTime` fields.
pub mod hm_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "option_hm_time")]` for `Option<NaiveTime>` fields.
pub mod option_hm_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&super::format_time(t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) if !s.trim().is_empty() => super::parse_time(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(date: &str, time: &str, room: &str) -> Slot {
        Slot::new(parse_date(date).unwrap(), parse_time(time).unwrap(), room).unwrap()
    }

    #[test]
    fn time_accepts_minutes_and_seconds_forms() {
        assert_eq!(parse_time("14:00").unwrap(), NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(parse_time("09:30:00").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn date_requires_iso_format() {
        assert!(parse_date("2025-06-15").is_ok());
        assert!(parse_date("15/06/2025").is_err());
    }

    #[test]
    fn blank_room_rejected() {
        let err = Slot::new(
            parse_date("2025-06-15").unwrap(),
            parse_time("14:00").unwrap(),
            "   ",
        )
        .unwrap_err();
        assert!(err.to_string().contains("room is required"));
    }

    #[test]
    fn slot_serializes_time_without_seconds() {
        let json = serde_json::to_value(slot("2025-06-15", "14:00", "A203")).unwrap();
        assert_eq!(json["date"], "2025-06-15");
        assert_eq!(json["time"], "14:00");
        assert_eq!(json["room"], "A203");
    }

    #[test]
    fn collision_requires_same_date_time_and_room() {
        let base = slot("2025-06-15", "14:00", "A203");
        assert!(base.collides_with(&slot("2025-06-15", "14:00", "a203")));
        assert!(!base.collides_with(&slot("2025-06-15", "15:00", "A203")));
        assert!(!base.collides_with(&slot("2025-06-16", "14:00", "A203")));
        assert!(!base.collides_with(&slot("2025-06-15", "14:00", "B101")));
    }
}
