//! Canonical script → editor rows.

use serde_json::{Map, Value};
use thiserror::Error;

use super::canonical::{desc_group, CanonicalTestCase, KeyedList};
use super::editor::{EditorTestCase, HookRow, Row, TypedRow, ValidateRow};
use super::Level;
use crate::infer::{classify_value, to_pretty_json, InferError};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Infer(#[from] InferError),

    #[error("Validator '{comparator}' must be [actual, expected, desc?], got {found}")]
    MalformedValidator { comparator: String, found: String },
}

/// Decodes a canonical case into editor rows.
///
/// Groups with no canonical data keep their single placeholder row.
/// Descriptions are looked up per key in the case's description map; a
/// missing entry reads as an empty string.
pub fn decode(case: &CanonicalTestCase, level: Level) -> Result<EditorTestCase, DecodeError> {
    let mut editor = EditorTestCase::blank(level);
    editor.name = case.name.clone();
    let request = &case.request;

    match level {
        Level::Test => {
            editor.times = Some(case.times.unwrap_or(1));
            editor.method = request.method.clone();
            editor.url = request.url.clone();

            if let Some(extract) = non_empty(&case.extract) {
                editor.extract = Some(
                    entries(extract)
                        .map(|(key, value)| Row {
                            key: key.clone(),
                            value: plain_text(value),
                            desc: case.description(desc_group::EXTRACT, key),
                        })
                        .collect(),
                );
            }

            if let Some(validate) = non_empty(&case.validate) {
                editor.validate = Some(
                    entries(validate)
                        .map(|(comparator, value)| validate_row(comparator, value))
                        .collect::<Result<_, _>>()?,
                );
            }
        }
        Level::Config => {
            editor.base_url = request.base_url.clone();

            if let Some(parameters) = non_empty(&case.parameters) {
                editor.parameters = Some(typed_rows(
                    entries(parameters),
                    case,
                    desc_group::PARAMETERS,
                )?);
            }
        }
    }

    if let Some(headers) = non_empty_map(&request.headers) {
        editor.header = headers
            .iter()
            .map(|(key, value)| Row {
                key: key.clone(),
                value: plain_text(value),
                desc: case.description(desc_group::HEADER, key),
            })
            .collect();
    }

    if let Some(data) = non_empty_map(&request.data) {
        editor.request.data = typed_rows(data.iter(), case, desc_group::DATA)?;
    }

    if let Some(params) = non_empty_map(&request.params) {
        editor.request.params = typed_rows(params.iter(), case, desc_group::PARAMS)?;
    }

    if let Some(files) = non_empty_map(&request.files) {
        editor.request.files = files
            .iter()
            .map(|(key, value)| Row {
                key: key.clone(),
                value: plain_text(value),
                desc: case.description(desc_group::FILES, key),
            })
            .collect();
    }

    if let Some(json) = request.json.as_ref().filter(|j| is_populated(j)) {
        editor.request.json_data = to_pretty_json(json)?;
    }

    if let Some(variables) = non_empty(&case.variables) {
        editor.variables = typed_rows(entries(variables), case, desc_group::VARIABLES)?;
    }

    let setup = case.setup_hooks.as_deref().unwrap_or_default();
    let teardown = case.teardown_hooks.as_deref().unwrap_or_default();
    if !setup.is_empty() || !teardown.is_empty() {
        editor.hooks = pair_hooks(setup, teardown);
    }

    Ok(editor)
}

/// Pairs setup and teardown hooks by position; the shorter side is padded
/// with empty strings.
pub fn pair_hooks(setup: &[String], teardown: &[String]) -> Vec<HookRow> {
    let len = setup.len().max(teardown.len());
    (0..len)
        .map(|i| HookRow {
            setup: setup.get(i).cloned().unwrap_or_default(),
            teardown: teardown.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}

fn validate_row(comparator: &str, value: &Value) -> Result<ValidateRow, DecodeError> {
    let malformed = || DecodeError::MalformedValidator {
        comparator: comparator.to_string(),
        found: value.to_string(),
    };
    let items = value.as_array().ok_or_else(malformed)?;
    let (actual, expected) = match items.as_slice() {
        [actual, expected, ..] => (actual, expected),
        _ => return Err(malformed()),
    };

    let expected = classify_value(expected)?;
    let desc = match items.get(2) {
        None | Some(Value::Null) => String::new(),
        Some(other) => plain_text(other),
    };

    Ok(ValidateRow {
        expect: expected.text,
        actual: plain_text(actual),
        comparator: comparator.to_string(),
        tag: expected.tag,
        desc,
    })
}

fn typed_rows<'a>(
    items: impl Iterator<Item = (&'a String, &'a Value)>,
    case: &CanonicalTestCase,
    group: &str,
) -> Result<Vec<TypedRow>, DecodeError> {
    items
        .map(|(key, value)| {
            let classified = classify_value(value)?;
            Ok(TypedRow {
                key: key.clone(),
                value: classified.text,
                tag: classified.tag,
                desc: case.description(group, key),
            })
        })
        .collect()
}

fn entries(list: &KeyedList) -> impl Iterator<Item = (&String, &Value)> {
    list.iter().flat_map(|entry| entry.iter())
}

fn non_empty(list: &Option<KeyedList>) -> Option<&KeyedList> {
    list.as_ref().filter(|l| !l.is_empty())
}

fn non_empty_map(map: &Option<Map<String, Value>>) -> Option<&Map<String, Value>> {
    map.as_ref().filter(|m| !m.is_empty())
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// An empty body (`{}`, `[]`, `""`, null) renders as an empty editor field.
fn is_populated(json: &Value) -> bool {
    match json {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
