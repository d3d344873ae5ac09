//! Rendering of `$name` placeholders into literal query text.
//!
//! The store's `GRAPH.QUERY` command takes one literal query string, so typed values are written
//! into the text instead of being bound. Two rules keep that safe:
//!
//! - **Longest name first.** At every `$`, candidate names are tried longest first and a name only
//!   matches when the next character cannot continue an identifier, so `$id` never eats the
//!   prefix of `$id_extra` whatever order the parameters arrive in. Substituted text is emitted
//!   once and never scanned again.
//! - **Type-aware literals.** Strings (and flattened lists) become double-quoted literals with
//!   backslash, quote, newline and carriage return escaped; integers are written bare.
//!
//! Placeholders with no entry in the parameter map are left untouched.

use std::collections::BTreeMap;

use crate::types::Value;

/// Placeholder name → value.
pub type Params = BTreeMap<String, Value>;

/// Render `template`, replacing every `$name` that has an entry in `params`.
pub fn render(template: &str, params: &Params) -> String {
    let mut names: Vec<&str> = params.keys().map(String::as_str).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = String::with_capacity(template.len() + 16 * params.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match names.iter().find(|name| placeholder_matches(after, name)) {
            Some(name) => {
                out.push_str(&literal(&params[*name]));
                rest = &after[name.len()..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Literal query text for a single value.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Int64(i) => i.to_string(),
        Value::Utf8(s) => quote(s),
        Value::List(items) => quote(&items.join(",")),
    }
}

/// Wrap `s` in double quotes, escaping everything that could end or reshape the literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn placeholder_matches(after_dollar: &str, name: &str) -> bool {
    !name.is_empty()
        && after_dollar.starts_with(name)
        && !after_dollar[name.len()..]
            .chars()
            .next()
            .is_some_and(is_ident_char)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
