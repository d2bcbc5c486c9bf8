//! Domain model module declarations.

pub mod chat;
pub mod classification;
pub mod conflict;
pub mod event;
pub mod note;
pub mod quota;
pub mod task;

/// `HH:MM` serialization for wall-clock times.
///
/// Stored records use the short 24-hour form. Parsing also accepts
/// `HH:MM:SS` so values written by other tools still load.
pub(crate) mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::Serializer;

    const FORMAT: &str = "%H:%M";

    /// Parse a wall-clock time in `HH:MM` or `HH:MM:SS` form, dropping
    /// any seconds.
    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
            .map(whole_minute)
    }

    /// `time` without seconds, the precision records are stored at.
    pub fn whole_minute(time: NaiveTime) -> NaiveTime {
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(FORMAT).to_string())
    }

    /// Optional variant; an empty string reads as `None`.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)] // serde `with` hands us `&Option<T>`.
        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid time: {raw}"))),
            }
        }
    }
}

/// Optional `YYYY-MM-DD` dates where an empty string reads as `None`.
pub(crate) mod opt_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ref_option)] // serde `with` hands us `&Option<T>`.
    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        date.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|err| serde::de::Error::custom(format!("invalid date {raw}: {err}"))),
        }
    }
}
