//! Editor form → canonical script.

use serde_json::{Map, Value};

use super::canonical::{desc_group, CanonicalRequest, CanonicalTestCase, Descriptions, KeyedList};
use super::form::CaseForm;
use super::Level;

/// Config-level keys in the order they are read. A missing key stops
/// population; it and every later key are reported as skipped.
const CONFIG_STEPS: [&str; 6] = [
    "base_url",
    "is_default",
    "parameters.parameters",
    "parameters.desc",
    "project",
    "nodeId",
];

/// Form metadata that is not part of the runner script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormMeta {
    pub project: Option<i64>,
    pub node_id: Option<i64>,
    pub is_default: Option<bool>,
}

/// Result of encoding a form.
///
/// `skipped` lists the keys that were not populated because a required key
/// was missing. The case is still returned with those fields unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded {
    pub case: CanonicalTestCase,
    pub meta: FormMeta,
    pub skipped: Vec<&'static str>,
}

impl Encoded {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Encodes a strongly-typed form.
pub fn encode_form(form: &CaseForm, level: Level) -> Result<Encoded, serde_json::Error> {
    Ok(encode(&form.to_value()?, level))
}

/// Encodes a submitted form into a canonical case.
///
/// Optional groups that are absent or empty are left out of the result. A
/// test-level JSON body is kept even when it is `{}`, since some endpoints
/// require an empty body. Test-level requests always carry `verify: false`.
pub fn encode(body: &Value, level: Level) -> Encoded {
    let mut skipped = Vec::new();
    let mut meta = FormMeta::default();

    let mut desc = Descriptions::new();
    desc.insert(
        desc_group::HEADER.into(),
        Value::Object(object_at(body, &["header", "desc"])),
    );

    let mut case = CanonicalTestCase {
        name: at(body, &["name"]).and_then(text),
        ..Default::default()
    };

    let populated = match level {
        Level::Test => {
            let groups: [(&str, &[&str]); 5] = [
                (desc_group::DATA, &["request", "form", "desc"]),
                (desc_group::FILES, &["request", "files", "desc"]),
                (desc_group::PARAMS, &["request", "params", "desc"]),
                (desc_group::VARIABLES, &["variables", "desc"]),
                (desc_group::EXTRACT, &["extract", "desc"]),
            ];
            for (group, path) in groups {
                desc.insert(group.into(), Value::Object(object_at(body, path)));
            }

            let json = at(body, &["request", "json"])
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));

            case.times = at(body, &["times"]).and_then(Value::as_u64);
            case.request = CanonicalRequest {
                url: at(body, &["url"]).and_then(text),
                method: at(body, &["method"]).and_then(text),
                verify: Some(false),
                params: non_empty(object_at(body, &["request", "params", "params"])),
                data: non_empty(object_at(body, &["request", "form", "data"])),
                files: non_empty(object_at(body, &["request", "files", "files"])),
                json: keep_body(json),
                ..Default::default()
            };
            case.extract = non_empty_list(keyed_at(body, &["extract", "extract"]));
            case.validate = non_empty_list(keyed_at(body, &["validate", "validate"]));
            Ok(())
        }
        Level::Config => {
            desc.insert(
                desc_group::VARIABLES.into(),
                Value::Object(object_at(body, &["variables", "desc"])),
            );
            fill_config(body, &mut case, &mut meta, &mut desc)
        }
    };

    match populated {
        Ok(()) => {
            meta.project = at(body, &["project"]).and_then(Value::as_i64);
            meta.node_id = at(body, &["nodeId"]).and_then(Value::as_i64);
        }
        Err(step) => {
            let from = CONFIG_STEPS.iter().position(|s| *s == step).unwrap_or(0);
            skipped.extend_from_slice(&CONFIG_STEPS[from..]);
        }
    }

    case.request.headers = non_empty(object_at(body, &["header", "header"]));
    case.variables = non_empty_list(keyed_at(body, &["variables", "variables"]));
    case.setup_hooks = non_empty_list(strings_at(body, &["hooks", "setup_hooks"]));
    case.teardown_hooks = non_empty_list(strings_at(body, &["hooks", "teardown_hooks"]));
    case.desc = desc;

    Encoded {
        case,
        meta,
        skipped,
    }
}

/// Reads the config-only keys, stopping at the first one that is missing.
fn fill_config(
    body: &Value,
    case: &mut CanonicalTestCase,
    meta: &mut FormMeta,
    desc: &mut Descriptions,
) -> Result<(), &'static str> {
    let base_url = at(body, &["base_url"]).ok_or("base_url")?;
    case.request = CanonicalRequest {
        base_url: text(base_url),
        ..Default::default()
    };

    let is_default = at(body, &["is_default"]).ok_or("is_default")?;
    meta.is_default = is_default.as_bool();

    at(body, &["parameters", "parameters"]).ok_or("parameters.parameters")?;
    case.parameters = non_empty_list(keyed_at(body, &["parameters", "parameters"]));

    let parameters_desc = at(body, &["parameters", "desc"]).ok_or("parameters.desc")?;
    desc.insert(
        desc_group::PARAMETERS.into(),
        Value::Object(parameters_desc.as_object().cloned().unwrap_or_default()),
    );

    Ok(())
}

fn at<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(body, |node, key| node.get(*key))
}

fn object_at(body: &Value, path: &[&str]) -> Map<String, Value> {
    at(body, path)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn keyed_at(body: &Value, path: &[&str]) -> KeyedList {
    at(body, path)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn strings_at(body: &Value, path: &[&str]) -> Vec<String> {
    at(body, path)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(text).collect())
        .unwrap_or_default()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn non_empty(map: Map<String, Value>) -> Option<Map<String, Value>> {
    (!map.is_empty()).then_some(map)
}

fn non_empty_list<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Keeps a populated body, and the empty mapping `{}`.
fn keep_body(json: Value) -> Option<Value> {
    let keep = match &json {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    };
    keep.then_some(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_form() -> Value {
        json!({
            "name": "login",
            "header": {
                "header": {"Content-Type": "application/json"},
                "desc": {"Content-Type": "body type"}
            },
            "request": {
                "form": {"data": {"user": "$user"}, "desc": {"user": "login name"}},
                "json": {"remember": true},
                "params": {"params": {"lang": "zh"}, "desc": {"lang": "locale"}},
                "files": {"files": {}, "desc": {}}
            },
            "extract": {"extract": [{"token": "content.token"}], "desc": {"token": "session"}},
            "validate": {"validate": [{"equals": ["status_code", 200, "ok"]}]},
            "variables": {"variables": [{"user": "alice"}], "desc": {"user": "who"}},
            "hooks": {"setup_hooks": ["${setup()}"], "teardown_hooks": []},
            "url": "/api/login",
            "method": "POST",
            "times": 2,
            "project": 3,
            "nodeId": 9
        })
    }

    #[test]
    fn test_encode_test_level() {
        let encoded = encode(&test_form(), Level::Test);
        assert!(encoded.is_complete());
        assert_eq!(
            encoded.meta,
            FormMeta {
                project: Some(3),
                node_id: Some(9),
                is_default: None
            }
        );

        let value = serde_json::to_value(&encoded.case).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "login",
                "times": 2,
                "request": {
                    "url": "/api/login",
                    "method": "POST",
                    "verify": false,
                    "headers": {"Content-Type": "application/json"},
                    "params": {"lang": "zh"},
                    "data": {"user": "$user"},
                    "json": {"remember": true}
                },
                "variables": [{"user": "alice"}],
                "setup_hooks": ["${setup()}"],
                "extract": [{"token": "content.token"}],
                "validate": [{"equals": ["status_code", 200, "ok"]}],
                "desc": {
                    "header": {"Content-Type": "body type"},
                    "data": {"user": "login name"},
                    "files": {},
                    "params": {"lang": "locale"},
                    "variables": {"user": "who"},
                    "extract": {"token": "session"}
                }
            })
        );
    }

    #[test]
    fn test_empty_json_body_is_kept() {
        let mut form = test_form();
        form["request"]["json"] = json!({});
        let encoded = encode(&form, Level::Test);
        assert_eq!(encoded.case.request.json, Some(json!({})));

        form["request"].as_object_mut().unwrap().remove("json");
        let encoded = encode(&form, Level::Test);
        assert_eq!(encoded.case.request.json, Some(json!({})));

        form["request"]["json"] = Value::Null;
        let encoded = encode(&form, Level::Test);
        assert_eq!(encoded.case.request.json, None);
    }

    #[test]
    fn test_empty_groups_are_omitted() {
        let encoded = encode(&json!({"name": "bare", "url": "/", "method": "GET"}), Level::Test);
        let case = &encoded.case;
        assert!(case.request.headers.is_none());
        assert!(case.request.params.is_none());
        assert!(case.request.data.is_none());
        assert!(case.request.files.is_none());
        assert!(case.variables.is_none());
        assert!(case.setup_hooks.is_none());
        assert!(case.teardown_hooks.is_none());
        assert!(case.extract.is_none());
        assert!(case.validate.is_none());
        assert_eq!(case.request.verify, Some(false));
        assert!(encoded.is_complete());
    }

    fn config_form() -> Value {
        json!({
            "name": "env",
            "header": {"header": {"X-Env": "qa"}, "desc": {"X-Env": "env"}},
            "variables": {"variables": [{"host": "qa.local"}], "desc": {"host": "target"}},
            "hooks": {"setup_hooks": [], "teardown_hooks": ["${cleanup()}"]},
            "base_url": "https://qa.example.com",
            "is_default": true,
            "parameters": {"parameters": [{"user-pwd": [["a", "1"]]}], "desc": {"user-pwd": "pairs"}},
            "project": 1
        })
    }

    #[test]
    fn test_encode_config_level() {
        let encoded = encode(&config_form(), Level::Config);
        assert!(encoded.is_complete());
        assert_eq!(encoded.meta.is_default, Some(true));
        assert_eq!(encoded.meta.project, Some(1));

        let value = serde_json::to_value(&encoded.case).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "env",
                "request": {
                    "base_url": "https://qa.example.com",
                    "headers": {"X-Env": "qa"}
                },
                "variables": [{"host": "qa.local"}],
                "parameters": [{"user-pwd": [["a", "1"]]}],
                "teardown_hooks": ["${cleanup()}"],
                "desc": {
                    "header": {"X-Env": "env"},
                    "variables": {"host": "target"},
                    "parameters": {"user-pwd": "pairs"}
                }
            })
        );
    }

    #[test]
    fn test_config_missing_base_url_skips_the_rest() {
        let mut form = config_form();
        form.as_object_mut().unwrap().remove("base_url");

        let encoded = encode(&form, Level::Config);
        assert_eq!(
            encoded.skipped,
            vec![
                "base_url",
                "is_default",
                "parameters.parameters",
                "parameters.desc",
                "project",
                "nodeId"
            ]
        );
        assert!(encoded.case.request.base_url.is_none());
        assert!(encoded.case.parameters.is_none());
        assert_eq!(encoded.meta, FormMeta::default());
        // Groups shared by both levels are still populated.
        assert!(encoded.case.request.headers.is_some());
        assert!(encoded.case.variables.is_some());
    }

    #[test]
    fn test_config_missing_parameter_desc_keeps_earlier_fields() {
        let mut form = config_form();
        form["parameters"].as_object_mut().unwrap().remove("desc");

        let encoded = encode(&form, Level::Config);
        assert_eq!(encoded.skipped, vec!["parameters.desc", "project", "nodeId"]);
        assert_eq!(
            encoded.case.request.base_url.as_deref(),
            Some("https://qa.example.com")
        );
        assert_eq!(encoded.meta.is_default, Some(true));
        assert!(encoded.case.parameters.is_some());
        assert!(!encoded.case.desc.contains_key("parameters"));
    }

    #[test]
    fn test_encode_typed_form() {
        let form: CaseForm = serde_json::from_value(test_form()).unwrap();
        let typed = encode_form(&form, Level::Test).unwrap();
        let loose = encode(&test_form(), Level::Test);
        assert_eq!(typed.case, loose.case);
    }
}
