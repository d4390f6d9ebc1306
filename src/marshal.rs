//! Rendering values as HTML form controls and parsing submitted fields back.
//!
//! Each kind has one render function and one parse rule:
//!
//! | kind  | control                     | submitted field                      |
//! |-------|-----------------------------|--------------------------------------|
//! | bool  | checkbox                    | present means true, absent false     |
//! | int   | `<input type="number">`     | empty is a no-op, junk is an error   |
//! | float | `<input type="number">`     | empty is a no-op, junk is an error   |
//! | text  | `<input type="text">`       | empty is a no-op                     |
//! | list  | `<textarea>`                | one item per line                    |
//! | dict  | two `<textarea>`s           | keys and values zipped by line       |

use std::collections::BTreeMap;

use crate::error::{ControlError, Result};
use crate::value::{Kind, Value};

/// Field-name suffix of the textarea holding a dict's keys.
pub const KEYS_SUFFIX: &str = ".keys";
/// Field-name suffix of the textarea holding a dict's values.
pub const VALUES_SUFFIX: &str = ".values";

/// HTML for one registry entry: its label and its form control(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub label: String,
    pub input: String,
}

/// Decoded form submission. A repeated field keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: BTreeMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormFields::new();
        for (name, value) in iter {
            form.insert(name, value);
        }
        form
    }
}

/// Escape the five HTML-reserved characters. `&` goes first so the entities
/// produced for the others are not escaped a second time.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Exact inverse of [`escape_html`]; `&amp;` is decoded last.
pub fn unescape_html(text: &str) -> String {
    text.replace("&#x27;", "'")
        .replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Render the label and control for `name` holding `value`.
pub fn render(name: &str, value: &Value) -> Rendered {
    let id = escape_html(name);

    match value {
        Value::Bool(checked) => Rendered {
            label: label(&id, &id),
            input: render_bool(&id, *checked),
        },
        Value::Int(i) => Rendered {
            label: label(&id, &id),
            input: render_number(&id, &i.to_string(), "1"),
        },
        // Number inputs reject "inf" and "NaN", so those stay editable as text.
        Value::Float(x) if !x.is_finite() => Rendered {
            label: label(&id, &id),
            input: render_text(&id, &x.to_string()),
        },
        Value::Float(x) => Rendered {
            label: label(&id, &id),
            input: render_number(&id, &x.to_string(), "any"),
        },
        Value::Text(text) => Rendered {
            label: label(&id, &id),
            input: render_text(&id, text),
        },
        Value::List(items) => Rendered {
            label: label(&id, &id),
            input: render_textarea(&id, items.iter().map(String::as_str)),
        },
        Value::Dict(map) => {
            let keys_id = format!("{}{}", id, KEYS_SUFFIX);
            let values_id = format!("{}{}", id, VALUES_SUFFIX);
            Rendered {
                label: label(&keys_id, &id),
                input: format!(
                    r#"<div class="dict">{}{}</div>"#,
                    render_textarea(&keys_id, map.keys().map(String::as_str)),
                    render_textarea(&values_id, map.values().map(String::as_str)),
                ),
            }
        },
    }
}

fn label(for_id: &str, text: &str) -> String {
    format!(r#"<label for="{}">{}</label>"#, for_id, text)
}

fn render_bool(id: &str, checked: bool) -> String {
    let checked = if checked { " checked" } else { "" };
    format!(
        r#"<input type="checkbox" id="{id}" name="{id}" value="on"{checked}>"#,
        id = id,
        checked = checked
    )
}

fn render_number(id: &str, value: &str, step: &str) -> String {
    format!(
        r#"<input type="number" id="{id}" name="{id}" step="{step}" value="{value}">"#,
        id = id,
        step = step,
        value = value
    )
}

fn render_text(id: &str, text: &str) -> String {
    format!(
        r#"<input type="text" id="{id}" name="{id}" value="{value}">"#,
        id = id,
        value = escape_html(text)
    )
}

fn render_textarea<'a>(id: &str, lines: impl Iterator<Item = &'a str>) -> String {
    let lines: Vec<String> = lines.map(escape_html).collect();
    let rows = lines.len().clamp(2, 20);
    // Browsers drop one newline right after the opening tag, so a leading
    // empty line needs this one to survive.
    format!(
        "<textarea id=\"{id}\" name=\"{id}\" rows=\"{rows}\">\n{body}</textarea>",
        id = id,
        rows = rows,
        body = lines.join("\n")
    )
}

/// Parse the submitted form for entry `name` of `kind`.
///
/// `Ok(None)` means the submission leaves the value unchanged.
pub fn parse(name: &str, kind: Kind, form: &FormFields) -> Result<Option<Value>> {
    match kind {
        Kind::Bool => Ok(Some(Value::Bool(form.contains(name)))),
        Kind::Int => parse_number(name, form.get(name), Kind::Int, |raw| {
            raw.parse::<i64>().ok().map(Value::Int)
        }),
        Kind::Float => parse_number(name, form.get(name), Kind::Float, |raw| {
            raw.parse::<f64>().ok().map(Value::Float)
        }),
        Kind::Text => Ok(form
            .get(name)
            .filter(|raw| !raw.is_empty())
            .map(|raw| Value::Text(unescape_html(raw)))),
        Kind::List => Ok(form.get(name).map(|raw| Value::List(split_lines(raw)))),
        Kind::Dict => parse_dict(name, form),
    }
}

fn parse_number<F>(name: &str, raw: Option<&str>, kind: Kind, convert: F) -> Result<Option<Value>>
where
    F: Fn(&str) -> Option<Value>,
{
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    convert(trimmed)
        .map(Some)
        .ok_or_else(|| ControlError::Parse {
            name: name.to_string(),
            kind,
            raw: raw.to_string(),
        })
}

/// Split textarea content into items. Empty content is an empty list;
/// otherwise every `\n` separates two items, and a trailing `\r` from
/// browser line endings is dropped.
fn split_lines(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('\n')
        .map(|line| unescape_html(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

fn parse_dict(name: &str, form: &FormFields) -> Result<Option<Value>> {
    let (keys, values) = match (
        form.get(&format!("{}{}", name, KEYS_SUFFIX)),
        form.get(&format!("{}{}", name, VALUES_SUFFIX)),
    ) {
        (None, None) => return Ok(None),
        (Some(keys), Some(values)) => (keys, values),
        (keys, _) => {
            return Err(ControlError::Parse {
                name: name.to_string(),
                kind: Kind::Dict,
                raw: format!(
                    "{} field missing",
                    if keys.is_none() { KEYS_SUFFIX } else { VALUES_SUFFIX }
                ),
            });
        },
    };

    // Rows are split without the empty-list shortcut so a single empty value
    // still lines up with its key; rows blank on both sides are skipped.
    let rows = |raw: &str| -> Vec<String> {
        raw.split('\n')
            .map(|line| unescape_html(line.strip_suffix('\r').unwrap_or(line)))
            .collect()
    };
    let keys = rows(keys);
    let values = rows(values);

    if keys.len() != values.len() {
        return Err(ControlError::Parse {
            name: name.to_string(),
            kind: Kind::Dict,
            raw: format!("{} keys, {} values", keys.len(), values.len()),
        });
    }

    Ok(Some(Value::Dict(
        keys.into_iter()
            .zip(values)
            .filter(|(key, value)| !(key.is_empty() && value.is_empty()))
            .collect(),
    )))
}
