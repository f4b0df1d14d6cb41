//! JSON pointer helpers for locating tokens in identity-provider payloads.

use serde_json::{Map, Value};

/// Read a non-empty string token at `pointer` (RFC 6901; `""` is the root).
pub(crate) fn read_token(doc: &Value, pointer: &str) -> Option<String> {
    match doc.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Build a request body that carries `token` at `pointer`.
///
/// `"/refresh_token"` yields `{"refresh_token": token}`; nested pointers
/// produce nested objects; `""` yields the bare string.
pub(crate) fn body_with_token(pointer: &str, token: &str) -> Value {
    let segments: Vec<String> = pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();

    segments
        .into_iter()
        .rev()
        .fold(Value::String(token.to_string()), |inner, key| {
            let mut map = Map::new();
            map.insert(key, inner);
            Value::Object(map)
        })
}
