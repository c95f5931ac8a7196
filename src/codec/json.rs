//! json-numpy conversion for the HTTP fallback body.
//!
//! Arrays are written as `{"__numpy__": <base64 data>, "dtype": "<f4", "shape": [..]}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Number, Value as Json};

use crate::codec::value::{DType, NdArray, Payload, Value};
use crate::error::{Error, Result};

const NUMPY_KEY: &str = "__numpy__";

/// Convert a payload into a JSON object.
pub fn to_json(payload: &Payload) -> Result<Json> {
    let mut object = Map::with_capacity(payload.len());
    for (key, value) in payload {
        object.insert(key.clone(), value_to_json(value)?);
    }
    Ok(Json::Object(object))
}

/// Convert a JSON object back into a payload.
pub fn from_json(json: Json) -> Result<Payload> {
    match value_from_json(json)? {
        Value::Map(map) => Ok(map),
        _ => Err(Error::Codec("Expected a JSON object at top level".into())),
    }
}

fn value_to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| Error::Codec(format!("Non-finite float {} is not valid JSON", f)))?,
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(_) => {
            return Err(Error::Codec("Raw bytes cannot be encoded as JSON".into()));
        }
        Value::Array(array) => json!({
            NUMPY_KEY: STANDARD.encode(array.data()),
            "dtype": array.dtype().descr(),
            "shape": array.shape(),
        }),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(value_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(map) => to_json(map)?,
    })
}

fn value_from_json(json: Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().ok_or_else(|| {
                Error::Codec(format!("Unrepresentable JSON number {}", n))
            })?),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(value_from_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Json::Object(object) if object.contains_key(NUMPY_KEY) => {
            Value::Array(ndarray_from_json(object)?)
        }
        Json::Object(object) => {
            let mut map = Payload::new();
            for (key, value) in object {
                map.insert(key, value_from_json(value)?);
            }
            Value::Map(map)
        }
    })
}

fn ndarray_from_json(object: Map<String, Json>) -> Result<NdArray> {
    let data = object
        .get(NUMPY_KEY)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Codec("Array data is not a base64 string".into()))?;
    let data = STANDARD
        .decode(data)
        .map_err(|e| Error::Codec(format!("Invalid base64 array data: {}", e)))?;

    let descr = object
        .get("dtype")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Codec("Array is missing 'dtype'".into()))?;
    let (dtype, order) = DType::parse_descr(descr)?;

    let shape = match object.get("shape") {
        Some(Json::Array(dims)) => dims
            .iter()
            .map(|dim| {
                dim.as_u64()
                    .and_then(|d| usize::try_from(d).ok())
                    .ok_or_else(|| Error::Codec(format!("Invalid array dimension: {}", dim)))
            })
            .collect::<Result<Vec<_>>>()?,
        // A missing shape is a flat vector.
        None => vec![data.len() / dtype.itemsize()],
        Some(other) => return Err(Error::Codec(format!("Invalid array shape: {}", other))),
    };

    NdArray::from_ordered(dtype, order, shape, data)
}
