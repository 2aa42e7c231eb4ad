//! Common types used throughout Backplate.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// RecordId //
//**********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for RecordId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for RecordId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(RecordId(i64::deserialize(deserializer)?))
	}
}

// Timestamp //
//***********//
/// Microseconds since the Unix epoch, UTC.
///
/// Microsecond resolution keeps `modified` strictly increasing across
/// back-to-back updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		Timestamp(Utc::now().timestamp_micros())
	}

	/// Current time, or one microsecond past `prev` if the clock has not moved beyond it.
	pub fn now_after(prev: Timestamp) -> Timestamp {
		let now = Timestamp::now();
		if now > prev { now } else { Timestamp(prev.0 + 1) }
	}

	pub fn to_datetime(self) -> DateTime<Utc> {
		DateTime::from_timestamp_micros(self.0).unwrap_or_default()
	}

	pub fn from_datetime(dt: DateTime<Utc>) -> Timestamp {
		Timestamp(dt.timestamp_micros())
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.to_datetime().to_rfc3339_opts(SecondsFormat::Micros, true))
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		let dt = DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?;
		Ok(Timestamp::from_datetime(dt.with_timezone(&Utc)))
	}
}

// Patch //
//*******//
/// Field of a partial update.
///
/// Use with `#[serde(default)]`: a missing field deserializes to `Undefined`,
/// an explicit `null` to `Null`, anything else to `Value`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Patch<T> {
	#[default]
	Undefined,
	Null,
	Value(T),
}

impl<T> Patch<T> {
	pub fn is_undefined(&self) -> bool {
		matches!(self, Patch::Undefined)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Patch::Null)
	}

	pub fn is_value(&self) -> bool {
		matches!(self, Patch::Value(_))
	}

	pub fn value(&self) -> Option<&T> {
		match self {
			Patch::Value(v) => Some(v),
			_ => None,
		}
	}

	/// `None` if undefined, `Some(None)` if null, `Some(Some(v))` if set
	pub fn as_option(&self) -> Option<Option<&T>> {
		match self {
			Patch::Undefined => None,
			Patch::Null => Some(None),
			Patch::Value(v) => Some(Some(v)),
		}
	}

	pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
		match self {
			Patch::Undefined => Patch::Undefined,
			Patch::Null => Patch::Null,
			Patch::Value(v) => Patch::Value(f(v)),
		}
	}

	/// Apply onto a nullable target
	pub fn apply_to(self, target: &mut Option<T>) {
		match self {
			Patch::Undefined => {}
			Patch::Null => *target = None,
			Patch::Value(v) => *target = Some(v),
		}
	}
}

impl<T: Serialize> Serialize for Patch<T> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Patch::Value(v) => v.serialize(serializer),
			Patch::Undefined | Patch::Null => serializer.serialize_none(),
		}
	}
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(match Option::<T>::deserialize(deserializer)? {
			Some(v) => Patch::Value(v),
			None => Patch::Null,
		})
	}
}


// vim: ts=4
