//! msgpack-numpy codec for WebSocket frames.
//!
//! Wire format: a single MessagePack map. Numeric arrays are nested maps
//! keyed by binary strings:
//!
//! ```text
//! {b"__ndarray__": true, b"data": <bin>, b"dtype": "<f4", b"shape": [2, 3]}
//! ```
//!
//! Numpy scalars use `{b"__npgeneric__": true, b"data": <scalar>, b"dtype": ..}`
//! and decode to the plain scalar value.

use rmpv::Value as Mp;

use crate::codec::value::{DType, NdArray, Payload, Value};
use crate::codec::Codec;
use crate::error::{Error, Result};

const NDARRAY_KEY: &str = "__ndarray__";
const NPGENERIC_KEY: &str = "__npgeneric__";
const DATA_KEY: &str = "data";
const DTYPE_KEY: &str = "dtype";
const SHAPE_KEY: &str = "shape";

/// The default structured codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackCodec;

impl Codec for MsgpackCodec {
    fn encode(&self, payload: &Payload) -> Result<Vec<u8>> {
        pack(payload)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Payload> {
        unpack(bytes)
    }
}

/// Encode a payload into one msgpack buffer.
pub fn pack(payload: &Payload) -> Result<Vec<u8>> {
    let value = encode_map(payload);
    let mut buffer = Vec::new();
    rmpv::encode::write_value(&mut buffer, &value)?;
    Ok(buffer)
}

/// Decode a msgpack buffer whose top-level value is a map.
pub fn unpack(bytes: &[u8]) -> Result<Payload> {
    let mut reader = bytes;
    let value = rmpv::decode::read_value(&mut reader)?;

    if !reader.is_empty() {
        return Err(Error::Codec(format!(
            "{} trailing bytes after payload",
            reader.len()
        )));
    }

    match decode_value(value)? {
        Value::Map(map) => Ok(map),
        other => Err(Error::Codec(format!(
            "Expected a mapping at top level, got {}",
            kind_name(&other)
        ))),
    }
}

fn encode_map(map: &Payload) -> Mp {
    Mp::Map(
        map.iter()
            .map(|(key, value)| (Mp::from(key.as_str()), encode_value(value)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Mp {
    match value {
        Value::Null => Mp::Nil,
        Value::Bool(b) => Mp::Boolean(*b),
        Value::Int(i) => Mp::from(*i),
        Value::Float(f) => Mp::F64(*f),
        Value::String(s) => Mp::from(s.as_str()),
        Value::Bytes(b) => Mp::Binary(b.clone()),
        Value::Array(array) => encode_ndarray(array),
        Value::List(items) => Mp::Array(items.iter().map(encode_value).collect()),
        Value::Map(map) => encode_map(map),
    }
}

fn encode_ndarray(array: &NdArray) -> Mp {
    let shape = array
        .shape()
        .iter()
        .map(|&dim| Mp::from(dim as u64))
        .collect();

    Mp::Map(vec![
        (binary_key(NDARRAY_KEY), Mp::Boolean(true)),
        (binary_key(DATA_KEY), Mp::Binary(array.data().to_vec())),
        (binary_key(DTYPE_KEY), Mp::from(array.dtype().descr())),
        (binary_key(SHAPE_KEY), Mp::Array(shape)),
    ])
}

fn binary_key(key: &str) -> Mp {
    Mp::Binary(key.as_bytes().to_vec())
}

fn decode_value(value: Mp) -> Result<Value> {
    match value {
        Mp::Nil => Ok(Value::Null),
        Mp::Boolean(b) => Ok(Value::Bool(b)),
        Mp::Integer(i) => match i.as_i64() {
            Some(v) => Ok(Value::Int(v)),
            None => Err(Error::Codec(format!("Integer {} out of i64 range", i))),
        },
        Mp::F32(f) => Ok(Value::Float(f as f64)),
        Mp::F64(f) => Ok(Value::Float(f)),
        Mp::String(s) => s
            .into_str()
            .map(Value::String)
            .ok_or_else(|| Error::Codec("Invalid UTF-8 in string".into())),
        Mp::Binary(b) => Ok(Value::Bytes(b)),
        Mp::Array(items) => items
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Mp::Map(entries) => decode_map(entries),
        Mp::Ext(tag, _) => Err(Error::Codec(format!("Unsupported ext type {}", tag))),
    }
}

fn decode_map(entries: Vec<(Mp, Mp)>) -> Result<Value> {
    if has_marker(&entries, NDARRAY_KEY) {
        return decode_ndarray(entries).map(Value::Array);
    }
    if has_marker(&entries, NPGENERIC_KEY) {
        return decode_npgeneric(entries);
    }

    let mut map = Payload::new();
    for (key, value) in entries {
        map.insert(key_string(key)?, decode_value(value)?);
    }
    Ok(Value::Map(map))
}

fn has_marker(entries: &[(Mp, Mp)], marker: &str) -> bool {
    entries
        .iter()
        .any(|(key, _)| key_str(key) == Some(marker))
}

/// Map keys arrive as str or, from Python `bytes` keys, as UTF-8 bin.
fn key_str(key: &Mp) -> Option<&str> {
    match key {
        Mp::String(s) => s.as_str(),
        Mp::Binary(b) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}

fn key_string(key: Mp) -> Result<String> {
    match key {
        Mp::String(s) => s
            .into_str()
            .ok_or_else(|| Error::Codec("Invalid UTF-8 in map key".into())),
        Mp::Binary(b) => {
            String::from_utf8(b).map_err(|_| Error::Codec("Invalid UTF-8 in map key".into()))
        }
        other => Err(Error::Codec(format!("Unsupported map key: {}", other))),
    }
}

fn take_field(entries: &mut Vec<(Mp, Mp)>, name: &str) -> Result<Mp> {
    let index = entries
        .iter()
        .position(|(key, _)| key_str(key) == Some(name))
        .ok_or_else(|| Error::Codec(format!("Array is missing '{}'", name)))?;
    Ok(entries.swap_remove(index).1)
}

fn decode_dtype(value: Mp) -> Result<String> {
    match value {
        Mp::String(s) => s
            .into_str()
            .ok_or_else(|| Error::Codec("Invalid UTF-8 in dtype".into())),
        Mp::Binary(b) => {
            String::from_utf8(b).map_err(|_| Error::Codec("Invalid UTF-8 in dtype".into()))
        }
        other => Err(Error::Codec(format!("Invalid dtype: {}", other))),
    }
}

fn decode_ndarray(mut entries: Vec<(Mp, Mp)>) -> Result<NdArray> {
    let data = match take_field(&mut entries, DATA_KEY)? {
        Mp::Binary(b) => b,
        other => return Err(Error::Codec(format!("Array data is not binary: {}", other))),
    };

    let descr = decode_dtype(take_field(&mut entries, DTYPE_KEY)?)?;
    let (dtype, order) = DType::parse_descr(&descr)?;

    let shape = match take_field(&mut entries, SHAPE_KEY)? {
        Mp::Array(dims) => dims
            .iter()
            .map(|dim| {
                dim.as_u64()
                    .and_then(|d| usize::try_from(d).ok())
                    .ok_or_else(|| Error::Codec(format!("Invalid array dimension: {}", dim)))
            })
            .collect::<Result<Vec<_>>>()?,
        other => return Err(Error::Codec(format!("Invalid array shape: {}", other))),
    };

    NdArray::from_ordered(dtype, order, shape, data)
}

fn decode_npgeneric(mut entries: Vec<(Mp, Mp)>) -> Result<Value> {
    let data = take_field(&mut entries, DATA_KEY)?;
    match decode_value(data)? {
        scalar @ (Value::Bool(_) | Value::Int(_) | Value::Float(_)) => Ok(scalar),
        other => Err(Error::Codec(format!(
            "Numpy scalar holds {}, expected a number",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::Array(_) => "array",
        Value::List(_) => "list",
        Value::Map(_) => "map",
    }
}
