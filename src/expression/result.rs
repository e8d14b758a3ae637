//! Typed results produced by every evaluation step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result types an expression node can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    String,
    Boolean,
    WholeNumber,
    Decimal,
    Date,
}

impl ResultType {
    pub const ALL: [ResultType; 5] = [
        ResultType::String,
        ResultType::Boolean,
        ResultType::WholeNumber,
        ResultType::Decimal,
        ResultType::Date,
    ];

    pub fn is_numeric(&self) -> bool {
        matches!(self, ResultType::WholeNumber | ResultType::Decimal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::String => "String",
            ResultType::Boolean => "Boolean",
            ResultType::WholeNumber => "Whole Number",
            ResultType::Decimal => "Decimal",
            ResultType::Date => "Date",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A present value of one of the result types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Boolean(bool),
    WholeNumber(i64),
    Decimal(f64),
    Date(DateTime<Utc>),
}

impl Value {
    /// Get the result type of this value
    pub fn result_type(&self) -> ResultType {
        match self {
            Value::String(_) => ResultType::String,
            Value::Boolean(_) => ResultType::Boolean,
            Value::WholeNumber(_) => ResultType::WholeNumber,
            Value::Decimal(_) => ResultType::Decimal,
            Value::Date(_) => ResultType::Date,
        }
    }
}

/// A result type paired with a value of that type, or with nothing.
///
/// Fields are private so the tag can never disagree with the value.
/// Deserialized results are checked the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTypedResult")]
pub struct TypedResult {
    result_type: ResultType,
    value: Option<Value>,
}

#[derive(Deserialize)]
struct RawTypedResult {
    result_type: ResultType,
    value: Option<Value>,
}

impl TryFrom<RawTypedResult> for TypedResult {
    type Error = String;

    fn try_from(raw: RawTypedResult) -> Result<Self, Self::Error> {
        match &raw.value {
            Some(value) if value.result_type() != raw.result_type => Err(format!(
                "{} value cannot be tagged as {}",
                value.result_type(),
                raw.result_type
            )),
            _ => Ok(Self {
                result_type: raw.result_type,
                value: raw.value,
            }),
        }
    }
}

impl TypedResult {
    /// An absent result of the given type
    pub fn absent(result_type: ResultType) -> Self {
        Self {
            result_type,
            value: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::from_value(Value::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::from_value(Value::Boolean(value))
    }

    pub fn whole_number(value: i64) -> Self {
        Self::from_value(Value::WholeNumber(value))
    }

    pub fn decimal(value: f64) -> Self {
        Self::from_value(Value::Decimal(value))
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Self::from_value(Value::Date(value))
    }

    pub fn optional_string(value: Option<String>) -> Self {
        value.map_or_else(|| Self::absent(ResultType::String), Self::string)
    }

    pub fn optional_boolean(value: Option<bool>) -> Self {
        value.map_or_else(|| Self::absent(ResultType::Boolean), Self::boolean)
    }

    pub fn optional_whole_number(value: Option<i64>) -> Self {
        value.map_or_else(|| Self::absent(ResultType::WholeNumber), Self::whole_number)
    }

    pub fn optional_decimal(value: Option<f64>) -> Self {
        value.map_or_else(|| Self::absent(ResultType::Decimal), Self::decimal)
    }

    pub fn optional_date(value: Option<DateTime<Utc>>) -> Self {
        value.map_or_else(|| Self::absent(ResultType::Date), Self::date)
    }

    /// Wrap a present value, taking its type as the tag
    pub fn from_value(value: Value) -> Self {
        Self {
            result_type: value.result_type(),
            value: Some(value),
        }
    }

    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Some(Value::Boolean(b)) => Some(b),
            _ => None,
        }
    }

    pub fn as_whole_number(&self) -> Option<i64> {
        match self.value {
            Some(Value::WholeNumber(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self.value {
            Some(Value::Decimal(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self.value {
            Some(Value::Date(d)) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_factories_keep_tag_and_value_aligned() {
        assert_eq!(TypedResult::string("a").result_type(), ResultType::String);
        assert_eq!(TypedResult::boolean(true).as_bool(), Some(true));
        assert_eq!(TypedResult::whole_number(7).as_whole_number(), Some(7));
        assert_eq!(TypedResult::decimal(1.5).as_decimal(), Some(1.5));

        let when = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let date = TypedResult::date(when);
        assert_eq!(date.result_type(), ResultType::Date);
        assert_eq!(date.as_date(), Some(when));
        // Accessors for other types see nothing
        assert_eq!(date.as_str(), None);
    }

    #[test]
    fn test_absent_results() {
        for ty in ResultType::ALL {
            let absent = TypedResult::absent(ty);
            assert!(absent.is_absent());
            assert_eq!(absent.result_type(), ty);
            assert_eq!(absent.value(), None);
        }

        let none = TypedResult::optional_decimal(None);
        assert_eq!(none.result_type(), ResultType::Decimal);
        assert!(none.is_absent());

        let some = TypedResult::optional_string(Some("x".to_string()));
        assert_eq!(some.as_str(), Some("x"));
    }

    #[test]
    fn test_deserialize_rejects_mismatched_tag() {
        let result: TypedResult =
            serde_json::from_str(r#"{"result_type":"WholeNumber","value":{"WholeNumber":5}}"#)
                .unwrap();
        assert_eq!(result, TypedResult::whole_number(5));

        let absent: TypedResult =
            serde_json::from_str(r#"{"result_type":"Date","value":null}"#).unwrap();
        assert_eq!(absent, TypedResult::absent(ResultType::Date));

        let err = serde_json::from_str::<TypedResult>(
            r#"{"result_type":"String","value":{"WholeNumber":5}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be tagged as String"));
    }

    #[test]
    fn test_result_type_display() {
        assert_eq!(ResultType::WholeNumber.to_string(), "Whole Number");
        assert!(ResultType::Decimal.is_numeric());
        assert!(!ResultType::Date.is_numeric());
    }
}
