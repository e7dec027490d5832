use chrono::{DateTime, Utc};
use serde::{self, Deserialize, Deserializer, Serialize, Serializer};
use serde::de::Error;

const ERROR: &str = "unable to construct DateTime<Utc> from i64";

/// Serializer for serde with to serialize a chrono `DateTime<Utc>` into a millisecond timestamp
/// This function is not used directly but rather from struct fields with a serde with attribute
/// pointing to this module
///
/// # Arguments
///
/// * 'date_time' - the date time object
/// * 'serializer' - serializer given from serde
pub fn serialize<S>(
    date_time: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    date_time.timestamp_millis().serialize(serializer)
}

pub fn deserialize<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let milli_seconds = i64::deserialize(d)?;

    DateTime::from_timestamp_millis(milli_seconds).ok_or_else(|| D::Error::custom(ERROR))
}
