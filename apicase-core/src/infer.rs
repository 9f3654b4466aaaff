//! Value classification for the editor wire format.
//!
//! Every value that crosses between the editor and the execution script is
//! carried as a `(type tag, text)` pair. The tag lets the editor render the
//! right input widget and lets the text be parsed back into the same shape.

use std::fmt;
use std::io;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;
use thiserror::Error;

/// Placeholder marker that forces the `Int` tag onto a string value.
pub const INT_PLACEHOLDER: &str = "$int";

/// Errors raised while classifying a value.
#[derive(Error, Debug)]
pub enum InferError {
    #[error("Unsupported value shape: {0}")]
    UnsupportedShape(String),
}

/// Errors raised while parsing row text back into a value.
#[derive(Error, Debug, PartialEq)]
#[error("Cannot read {text:?} as {tag}")]
pub struct ValueParseError {
    pub tag: TypeTag,
    pub text: String,
}

/// Semantic value shape, encoded on the wire as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeTag {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Sequence,
    Mapping,
    Null,
}

impl TypeTag {
    pub fn code(self) -> u8 {
        match self {
            TypeTag::String => 1,
            TypeTag::Int => 2,
            TypeTag::Float => 3,
            TypeTag::Bool => 4,
            TypeTag::Sequence => 5,
            TypeTag::Mapping => 6,
            TypeTag::Null => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(TypeTag::String),
            2 => Some(TypeTag::Int),
            3 => Some(TypeTag::Float),
            4 => Some(TypeTag::Bool),
            5 => Some(TypeTag::Sequence),
            6 => Some(TypeTag::Mapping),
            7 => Some(TypeTag::Null),
            _ => None,
        }
    }

    /// Parses editor text back into a value of this shape.
    ///
    /// `Int` text that carries the `$int` placeholder stays a string, mirroring
    /// [`classify_value`].
    pub fn parse(self, text: Option<&str>) -> Result<Value, ValueParseError> {
        let Some(text) = text else {
            return Ok(Value::Null);
        };
        let fail = || ValueParseError {
            tag: self,
            text: text.to_string(),
        };

        match self {
            TypeTag::String => Ok(Value::String(text.to_string())),
            TypeTag::Int if text.contains(INT_PLACEHOLDER) => Ok(Value::String(text.to_string())),
            TypeTag::Int => {
                let trimmed = text.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    Ok(Value::from(n))
                } else {
                    trimmed.parse::<u64>().map(Value::from).map_err(|_| fail())
                }
            }
            TypeTag::Float => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(fail),
            TypeTag::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            TypeTag::Sequence => match serde_json::from_str(text) {
                Ok(value @ Value::Array(_)) => Ok(value),
                _ => Err(fail()),
            },
            TypeTag::Mapping => match serde_json::from_str(text) {
                Ok(value @ Value::Object(_)) => Ok(value),
                _ => Err(fail()),
            },
            TypeTag::Null => Ok(Value::Null),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::String => write!(f, "string"),
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Sequence => write!(f, "sequence"),
            TypeTag::Mapping => write!(f, "mapping"),
            TypeTag::Null => write!(f, "null"),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        TypeTag::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown type tag {}", code)))
    }
}

/// A classified value: its tag plus the text the editor displays.
///
/// `text` is `None` only for null values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub tag: TypeTag,
    pub text: Option<String>,
}

impl Classified {
    /// Text form, with null rendered as an empty string.
    pub fn text_or_empty(&self) -> String {
        self.text.clone().unwrap_or_default()
    }
}

/// Classifies any serializable value.
///
/// Values that cannot be represented as JSON (for example maps with
/// non-string keys) fail with [`InferError::UnsupportedShape`].
pub fn classify<T: Serialize + ?Sized>(value: &T) -> Result<Classified, InferError> {
    let value =
        serde_json::to_value(value).map_err(|e| InferError::UnsupportedShape(e.to_string()))?;
    classify_value(&value)
}

/// Classifies a JSON value.
///
/// A string containing `$int` anywhere is tagged `Int` and kept verbatim.
pub fn classify_value(value: &Value) -> Result<Classified, InferError> {
    let classified = match value {
        Value::Null => Classified {
            tag: TypeTag::Null,
            text: None,
        },
        Value::String(s) if s.contains(INT_PLACEHOLDER) => Classified {
            tag: TypeTag::Int,
            text: Some(s.clone()),
        },
        Value::String(s) => Classified {
            tag: TypeTag::String,
            text: Some(s.clone()),
        },
        Value::Bool(b) => Classified {
            tag: TypeTag::Bool,
            text: Some(b.to_string()),
        },
        Value::Number(n) if n.is_f64() => Classified {
            tag: TypeTag::Float,
            text: Some(n.to_string()),
        },
        Value::Number(n) => Classified {
            tag: TypeTag::Int,
            text: Some(n.to_string()),
        },
        Value::Array(_) => Classified {
            tag: TypeTag::Sequence,
            text: Some(to_spaced_json(value)?),
        },
        Value::Object(_) => Classified {
            tag: TypeTag::Mapping,
            text: Some(to_spaced_json(value)?),
        },
    };
    Ok(classified)
}

/// One-line JSON with `", "` and `": "` separators, non-ASCII kept as is.
pub fn to_spaced_json(value: &Value) -> Result<String, InferError> {
    write_with(value, SpacedFormatter)
}

/// Four-space indented JSON, non-ASCII kept as is.
pub fn to_pretty_json(value: &Value) -> Result<String, InferError> {
    write_with(value, PrettyFormatter::with_indent(b"    "))
}

fn write_with<F: Formatter>(value: &Value, formatter: F) -> Result<String, InferError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| InferError::UnsupportedShape(e.to_string()))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn pair(value: Value) -> (TypeTag, Option<String>) {
        let c = classify_value(&value).unwrap();
        (c.tag, c.text)
    }

    #[test]
    fn test_classify_null() {
        assert_eq!(pair(Value::Null), (TypeTag::Null, None));
    }

    #[test]
    fn test_classify_scalars() {
        assert_eq!(pair(json!(42)), (TypeTag::Int, Some("42".into())));
        assert_eq!(pair(json!(-7)), (TypeTag::Int, Some("-7".into())));
        assert_eq!(pair(json!(1.5)), (TypeTag::Float, Some("1.5".into())));
        assert_eq!(pair(json!(true)), (TypeTag::Bool, Some("true".into())));
        assert_eq!(pair(json!("abc")), (TypeTag::String, Some("abc".into())));
    }

    #[test]
    fn test_classify_collections_use_spaced_separators() {
        assert_eq!(pair(json!([1, 2])), (TypeTag::Sequence, Some("[1, 2]".into())));
        assert_eq!(
            pair(json!({"a": 1, "b": "中文"})),
            (TypeTag::Mapping, Some(r#"{"a": 1, "b": "中文"}"#.into()))
        );
    }

    #[test]
    fn test_int_placeholder_anywhere_in_string() {
        assert_eq!(
            pair(json!("$int_ref")),
            (TypeTag::Int, Some("$int_ref".into()))
        );
        assert_eq!(
            pair(json!("prefix ${$int_count} suffix")),
            (TypeTag::Int, Some("prefix ${$int_count} suffix".into()))
        );
        assert_eq!(pair(json!("$in")), (TypeTag::String, Some("$in".into())));
    }

    #[test]
    fn test_classify_unsupported_shape_is_error() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys");
        let result = classify(&map);
        assert!(matches!(result, Err(InferError::UnsupportedShape(_))));
    }

    #[test]
    fn test_tag_codes_are_bijective() {
        for code in 1..=7u8 {
            let tag = TypeTag::from_code(code).unwrap();
            assert_eq!(tag.code(), code);
        }
        assert!(TypeTag::from_code(0).is_none());
        assert!(TypeTag::from_code(8).is_none());
    }

    #[test]
    fn test_tag_serializes_as_number() {
        assert_eq!(serde_json::to_string(&TypeTag::Mapping).unwrap(), "6");
        let tag: TypeTag = serde_json::from_str("4").unwrap();
        assert_eq!(tag, TypeTag::Bool);
        assert!(serde_json::from_str::<TypeTag>("9").is_err());
    }

    #[test]
    fn test_parse_reverses_classify() {
        for value in [
            json!("text"),
            json!(12),
            json!(0.25),
            json!(false),
            json!([1, "two", null]),
            json!({"k": {"nested": [1]}}),
            Value::Null,
            json!("$int_id"),
        ] {
            let c = classify_value(&value).unwrap();
            assert_eq!(c.tag.parse(c.text.as_deref()).unwrap(), value);
        }
    }

    #[test]
    fn test_parse_rejects_mismatched_text() {
        assert!(TypeTag::Int.parse(Some("twelve")).is_err());
        assert!(TypeTag::Bool.parse(Some("yes")).is_err());
        assert!(TypeTag::Sequence.parse(Some("{}")).is_err());
        assert_eq!(
            TypeTag::Bool.parse(Some("True")).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_pretty_json_indent() {
        let text = to_pretty_json(&json!({"a": [1], "名": "值"})).unwrap();
        assert_eq!(text, "{\n    \"a\": [\n        1\n    ],\n    \"名\": \"值\"\n}");
    }
}
