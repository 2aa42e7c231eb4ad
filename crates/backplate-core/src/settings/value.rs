//! Resolved settings store

use std::collections::BTreeMap;
use std::fmt;

use crate::prelude::*;

/// Setting value types
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
	String(String),
	Int(i64),
	Float(f64),
	Bool(bool),
	List(Vec<SettingValue>),
	Table(BTreeMap<String, SettingValue>),
}

impl SettingValue {
	/// Get the type name for error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			SettingValue::String(_) => "string",
			SettingValue::Int(_) => "int",
			SettingValue::Float(_) => "float",
			SettingValue::Bool(_) => "bool",
			SettingValue::List(_) => "list",
			SettingValue::Table(_) => "table",
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			SettingValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			SettingValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Floats, or ints widened to float
	#[allow(clippy::cast_precision_loss)]
	pub fn as_float(&self) -> Option<f64> {
		match self {
			SettingValue::Float(f) => Some(*f),
			SettingValue::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			SettingValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_table(&self) -> Option<&BTreeMap<String, SettingValue>> {
		match self {
			SettingValue::Table(t) => Some(t),
			_ => None,
		}
	}

	/// Parse an environment string into the same type as `self`.
	///
	/// Booleans are true only for a case-insensitive `"true"`. Lists are split
	/// on commas. Returns `None` if the string does not parse as that type.
	pub fn coerce_like(&self, raw: &str) -> Option<SettingValue> {
		match self {
			SettingValue::String(_) => Some(SettingValue::String(raw.to_string())),
			SettingValue::Int(_) => raw.trim().parse().ok().map(SettingValue::Int),
			SettingValue::Float(_) => raw.trim().parse().ok().map(SettingValue::Float),
			SettingValue::Bool(_) => Some(SettingValue::Bool(raw.trim().eq_ignore_ascii_case("true"))),
			SettingValue::List(_) => Some(SettingValue::List(
				raw.split(',')
					.map(str::trim)
					.filter(|s| !s.is_empty())
					.map(|s| SettingValue::String(s.to_string()))
					.collect(),
			)),
			SettingValue::Table(_) => None,
		}
	}
}

impl fmt::Display for SettingValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SettingValue::String(s) => write!(f, "{}", s),
			SettingValue::Int(i) => write!(f, "{}", i),
			SettingValue::Float(v) => write!(f, "{}", v),
			SettingValue::Bool(b) => write!(f, "{}", b),
			SettingValue::List(items) => {
				let items: Vec<String> = items.iter().map(ToString::to_string).collect();
				write!(f, "{}", items.join(","))
			}
			SettingValue::Table(_) => write!(f, "<table>"),
		}
	}
}

impl From<&str> for SettingValue {
	fn from(s: &str) -> Self {
		SettingValue::String(s.to_string())
	}
}

impl From<String> for SettingValue {
	fn from(s: String) -> Self {
		SettingValue::String(s)
	}
}

impl From<i64> for SettingValue {
	fn from(i: i64) -> Self {
		SettingValue::Int(i)
	}
}

impl From<f64> for SettingValue {
	fn from(v: f64) -> Self {
		SettingValue::Float(v)
	}
}

impl From<bool> for SettingValue {
	fn from(b: bool) -> Self {
		SettingValue::Bool(b)
	}
}

// Settings //
//**********//
/// Resolved settings for one environment.
///
/// Keys are addressed by dotted path (`"slack.channel_id"`). Built once at
/// startup; `set` and `clear` exist for tests.
#[derive(Debug, Clone, Default)]
pub struct Settings {
	env: String,
	store: BTreeMap<String, SettingValue>,
}

impl Settings {
	pub fn new(env: impl Into<String>) -> Self {
		Self { env: env.into(), store: BTreeMap::new() }
	}

	/// Active environment name (`PROJECT_ENV`)
	pub fn env(&self) -> &str {
		&self.env
	}

	pub fn try_get(&self, path: &str) -> Option<&SettingValue> {
		let mut segments = path.split('.');
		let first = segments.next()?;
		let mut value = self.store.get(first)?;
		for segment in segments {
			value = value.as_table()?.get(segment)?;
		}
		Some(value)
	}

	pub fn get(&self, path: &str) -> BpResult<&SettingValue> {
		self.try_get(path)
			.ok_or_else(|| Error::ConfigError(format!("setting '{}' does not exist", path)))
	}

	fn type_error(path: &str, expected: &str, value: &SettingValue) -> Error {
		Error::ConfigError(format!(
			"setting '{}' should be {}, found {}",
			path,
			expected,
			value.type_name()
		))
	}

	pub fn get_str(&self, path: &str) -> BpResult<&str> {
		let value = self.get(path)?;
		value.as_str().ok_or_else(|| Self::type_error(path, "string", value))
	}

	pub fn get_int(&self, path: &str) -> BpResult<i64> {
		let value = self.get(path)?;
		value.as_int().ok_or_else(|| Self::type_error(path, "int", value))
	}

	pub fn get_float(&self, path: &str) -> BpResult<f64> {
		let value = self.get(path)?;
		value.as_float().ok_or_else(|| Self::type_error(path, "float", value))
	}

	pub fn get_bool(&self, path: &str) -> BpResult<bool> {
		let value = self.get(path)?;
		value.as_bool().ok_or_else(|| Self::type_error(path, "bool", value))
	}

	pub fn section(&self, path: &str) -> BpResult<&BTreeMap<String, SettingValue>> {
		let value = self.get(path)?;
		value.as_table().ok_or_else(|| Self::type_error(path, "table", value))
	}

	/// Top-level key lookup, matching either the lower- or uppercase spelling
	pub fn contains(&self, key: &str) -> bool {
		self.store.contains_key(&key.to_lowercase()) || self.store.contains_key(&key.to_uppercase())
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.store.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
		self.store.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	/// Set a value at a dotted path, creating intermediate tables.
	///
	/// A non-table value sitting on the path is replaced by a table.
	pub fn set(&mut self, path: &str, value: impl Into<SettingValue>) {
		let value = value.into();
		let mut segments: Vec<&str> = path.split('.').collect();
		let Some(leaf) = segments.pop() else {
			return;
		};
		let mut table = &mut self.store;
		for segment in segments {
			let entry = table
				.entry(segment.to_string())
				.or_insert_with(|| SettingValue::Table(BTreeMap::new()));
			if !matches!(entry, SettingValue::Table(_)) {
				*entry = SettingValue::Table(BTreeMap::new());
			}
			let SettingValue::Table(inner) = entry else {
				return;
			};
			table = inner;
		}
		table.insert(leaf.to_string(), value);
	}

	pub fn clear(&mut self) {
		self.store.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_dotted_access() {
		let mut settings = Settings::new("local");
		settings.set("project_name", "backplate");
		settings.set("slack.channel_id", "C123");
		settings.set("slack.retry_count", 3_i64);

		assert_eq!(settings.get_str("project_name").unwrap(), "backplate");
		assert_eq!(settings.get_str("slack.channel_id").unwrap(), "C123");
		assert_eq!(settings.get_int("slack.retry_count").unwrap(), 3);
		assert_eq!(settings.section("slack").unwrap().len(), 2);
		assert!(settings.contains("PROJECT_NAME"));
		assert!(matches!(settings.get("slack.missing"), Err(Error::ConfigError(_))));
		assert!(matches!(settings.get_int("project_name"), Err(Error::ConfigError(_))));

		settings.clear();
		assert!(settings.is_empty());
	}

	#[test]
	fn test_coerce_like() {
		let int = SettingValue::Int(0);
		assert_eq!(int.coerce_like("42"), Some(SettingValue::Int(42)));
		assert_eq!(int.coerce_like("x"), None);

		let flag = SettingValue::Bool(false);
		assert_eq!(flag.coerce_like("TRUE"), Some(SettingValue::Bool(true)));
		assert_eq!(flag.coerce_like("yes"), Some(SettingValue::Bool(false)));

		let list = SettingValue::List(vec![]);
		assert_eq!(
			list.coerce_like("a, b"),
			Some(SettingValue::List(vec!["a".into(), "b".into()]))
		);
	}
}

// vim: ts=4
