use std::fmt;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::de::{Error as DeError, Visitor};
use serde::{Deserializer, Serializer};

/// Serde bridge for timestamps that must be visible to storage-side date
/// handling (expiry indexes operate on real dates, not strings).
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    chrono_datetime_as_bson_datetime::serialize(value, serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DateTimeVisitor)
}

struct DateTimeVisitor;

impl<'de> Visitor<'de> for DateTimeVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an ISO8601 string or a BSON date sub-document")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: DeError,
    {
        value.parse::<DateTime<Utc>>().map_err(DeError::custom)
    }

    fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
    where
        M: serde::de::MapAccess<'de>,
    {
        chrono_datetime_as_bson_datetime::deserialize(serde::de::value::MapAccessDeserializer::new(
            map,
        ))
    }
}
