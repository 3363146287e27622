use indexmap::IndexMap;

use super::error::ParseError;

/// Fields in document order.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    /// A quoted string, without its quotes.
    String(String),
    /// An unquoted scalar such as `12`, `0.5` or `2.5km`. Units are kept, nothing is coerced.
    Literal(String),
    Map(Map),
}

/// Decodes the bytes of a value token.
pub(crate) fn decode(token: &[u8], at: u64) -> Result<Value, ParseError> {
    let first = *token.first().ok_or(ParseError::EmptyValue { at })?;

    let value = match first {
        b'N' => Value::Null,
        b't' => Value::Bool(true),
        b'f' => Value::Bool(false),
        b'"' | b'\'' => {
            let inner = if token.len() >= 2 {
                &token[1..token.len() - 1]
            } else {
                &[]
            };
            Value::String(String::from_utf8_lossy(inner).into_owned())
        }
        _ => Value::Literal(
            std::str::from_utf8(token)
                .map_err(|_| ParseError::InvalidUtf8 { at })?
                .to_string(),
        ),
    };

    Ok(value)
}

impl Value {
    /// The text of a string or literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Looks up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    /// Projects a `num` / `item[n]` group onto its items, in order.
    pub fn as_list(&self) -> Option<Vec<&Value>> {
        to_list(self.as_map()?)
    }

    /// Projects a group of `mat[n]` keys onto a matrix. Matrices may be partial,
    /// missing cells are `None`.
    pub fn as_matrix(&self) -> Option<Vec<Option<&Value>>> {
        to_matrix(self.as_map()?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::String(s) | Value::Literal(s) => serde_json::Value::String(s.clone()),
            Value::Map(map) => map_to_json(map),
        }
    }
}

pub(crate) fn map_to_json(map: &Map) -> serde_json::Value {
    serde_json::Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

pub fn to_list(map: &Map) -> Option<Vec<&Value>> {
    let num = map.get("num")?.as_str()?.trim().parse::<usize>().ok()?;
    (0..num)
        .map(|i| map.get(&format!("item[{}]", i)))
        .collect()
}

fn matrix_index(key: &str) -> Option<usize> {
    key.strip_prefix("mat[")?.strip_suffix(']')?.parse().ok()
}

pub fn to_matrix(map: &Map) -> Option<Vec<Option<&Value>>> {
    let mut cells = vec![];
    for (key, value) in map.iter() {
        let index = matrix_index(key)?;
        if cells.len() <= index {
            cells.resize(index + 1, None);
        }
        cells[index] = Some(value);
    }

    if cells.is_empty() {
        return None;
    }
    Some(cells)
}
