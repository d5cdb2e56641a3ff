//! Field typing: name normalization and single-sample type inference.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value_objects::is_identifier;

/// Column names every generated table already owns.
pub const RESERVED_FIELDS: [&str; 2] = ["uid", "ts"];

/// Timestamp formats, in the order they are tried.
pub const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M:%S"];

const DATETIME_PREFIX: &str = "datetime|";

/// Collapse every run of non `[A-Za-z0-9]` characters into one `_`, then
/// lower-case. Idempotent.
pub fn normalize_field_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

// ── FieldName ────────────────────────────────────────────────────────────────

/// A normalized, non-reserved column name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(String);

impl FieldName {
    /// Normalize `raw` and validate the result.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = normalize_field_name(raw);
        if !is_identifier(&value) {
            return Err(DomainError::InvalidIdentifier {
                value: raw.into(),
                reason: "field name is empty after normalization".into(),
            });
        }
        if RESERVED_FIELDS.contains(&value.as_str()) {
            return Err(DomainError::InvalidIdentifier {
                value,
                reason: format!("field names {RESERVED_FIELDS:?} are reserved"),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── FieldType ────────────────────────────────────────────────────────────────

/// Scalar type of a column, persisted as `int`, `float`, `str` or
/// `datetime|<format>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Float,
    Str,
    DateTime(String),
}

impl FieldType {
    /// Infer the type of one raw sample. Total and deterministic: the first
    /// matching rule wins and `Str` is the fallback.
    pub fn infer(sample: &str) -> Self {
        if !sample.is_empty() && sample.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Int;
        }

        if sample.trim().parse::<f64>().is_ok() {
            return Self::Float;
        }

        TIMESTAMP_FORMATS
            .iter()
            .find(|format| NaiveDateTime::parse_from_str(sample, format).is_ok())
            .map(|format| Self::DateTime((*format).to_string()))
            .unwrap_or(Self::Str)
    }

    /// Type name without the timestamp format (`datetime` for timestamps).
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateTime(format) => write!(f, "{DATETIME_PREFIX}{format}"),
            other => f.write_str(other.base_name()),
        }
    }
}

impl FromStr for FieldType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "str" => Ok(Self::Str),
            other => match other.strip_prefix(DATETIME_PREFIX) {
                Some(format) if !format.is_empty() => Ok(Self::DateTime(format.to_string())),
                _ => Err(DomainError::InvalidFieldType {
                    value: other.to_string(),
                }),
            },
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── Field / FieldMap ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: FieldName,
    pub field_type: FieldType,
}

impl Field {
    /// Build a field from one header cell and the matching sample cell.
    pub fn from_sample(header: &str, sample: &str) -> DomainResult<Self> {
        Ok(Self {
            name: FieldName::parse(header)?,
            field_type: FieldType::infer(sample),
        })
    }
}

/// Fields in header order, serialized as a `{name: type}` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<Field>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Names must be unique.
    pub fn insert(&mut self, field: Field) -> DomainResult<()> {
        if self.get(field.name.as_str()).is_some() {
            return Err(DomainError::InvalidIdentifier {
                value: field.name.to_string(),
                reason: "duplicate field name".into(),
            });
        }
        self.0.push(field);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.0.iter().find(|f| f.name.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in &self.0 {
            map.serialize_entry(field.name.as_str(), &field.field_type)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field types")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut fields = FieldMap::new();
                while let Some((name, field_type)) =
                    access.next_entry::<String, FieldType>()?
                {
                    // Stored names are already normalized; reject anything that is not.
                    let parsed = FieldName::parse(&name).map_err(serde::de::Error::custom)?;
                    if parsed.as_str() != name {
                        return Err(serde::de::Error::custom(format!(
                            "field name '{name}' is not normalized"
                        )));
                    }
                    fields
                        .insert(Field {
                            name: parsed,
                            field_type,
                        })
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_scalar_types() {
        assert_eq!(FieldType::infer("42"), FieldType::Int);
        assert_eq!(FieldType::infer("3.14"), FieldType::Float);
        assert_eq!(FieldType::infer("-7"), FieldType::Float);
        assert_eq!(FieldType::infer("abc"), FieldType::Str);
        assert_eq!(FieldType::infer(""), FieldType::Str);
    }

    #[test]
    fn infers_timestamps_in_fixed_order() {
        assert_eq!(
            FieldType::infer("2024-01-01 00:00:00").to_string(),
            "datetime|%Y-%m-%d %H:%M:%S"
        );
        assert_eq!(
            FieldType::infer("31.12.2023 23:59:59").to_string(),
            "datetime|%d.%m.%Y %H:%M:%S"
        );
        assert_eq!(FieldType::infer("2024-13-01 00:00:00"), FieldType::Str);
    }

    #[test]
    fn inference_is_deterministic() {
        for sample in ["1", "1.5", "2024-01-01 00:00:00", "x"] {
            assert_eq!(FieldType::infer(sample), FieldType::infer(sample));
        }
    }

    #[test]
    fn field_type_round_trips_through_text() {
        for text in ["int", "float", "str", "datetime|%d.%m.%Y %H:%M:%S"] {
            assert_eq!(text.parse::<FieldType>().unwrap().to_string(), text);
        }
        assert!("datetime|".parse::<FieldType>().is_err());
        assert!("bool".parse::<FieldType>().is_err());
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_field_name("Logged At"), "logged_at");
        assert_eq!(normalize_field_name("a--b  c"), "a_b_c");
        assert_eq!(normalize_field_name("Prix (€)"), "prix_");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["Logged At", "__x__", "a--b", "Ünïcode name", "already_ok", "!!"] {
            let once = normalize_field_name(raw);
            assert_eq!(normalize_field_name(&once), once, "input: {raw}");
        }
    }

    #[test]
    fn reserved_names_are_rejected() {
        assert!(matches!(
            FieldName::parse("UID"),
            Err(DomainError::InvalidIdentifier { .. })
        ));
        assert!(FieldName::parse("ts").is_err());
        assert!(FieldName::parse("tss").is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(FieldName::parse("").is_err());
    }

    #[test]
    fn field_map_keeps_header_order_through_json() {
        let mut map = FieldMap::new();
        for (h, v) in [("zeta", "1"), ("alpha", "x"), ("mid", "2.5")] {
            map.insert(Field::from_sample(h, v).unwrap()).unwrap();
        }
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":"int","alpha":"str","mid":"float"}"#);

        let back: FieldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn field_map_rejects_duplicates() {
        let mut map = FieldMap::new();
        map.insert(Field::from_sample("Name", "a").unwrap()).unwrap();
        assert!(map.insert(Field::from_sample("name", "b").unwrap()).is_err());
    }
}
