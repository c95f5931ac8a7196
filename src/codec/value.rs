//! Dynamically shaped payload values.
//!
//! Observations, actions and server metadata are all string-keyed maps of
//! [`Value`]. Numeric arrays travel as [`NdArray`]: a dtype, a shape and the
//! raw C-order little-endian element bytes.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A string-keyed mapping of values; the unit every codec operates on.
pub type Payload = BTreeMap<String, Value>;

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(NdArray),
    List(Vec<Value>),
    Map(Payload),
}

impl Value {
    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Payload> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NdArray> for Value {
    fn from(v: NdArray) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Payload> for Value {
    fn from(v: Payload) -> Self {
        Value::Map(v)
    }
}

/// Element types an [`NdArray`] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
}

/// Byte order prefix of a numpy dtype descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl DType {
    /// Size of one element in bytes.
    pub fn itemsize(self) -> usize {
        match self {
            DType::Bool | DType::I8 | DType::U8 => 1,
            DType::I16 | DType::U16 | DType::F16 => 2,
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 => 8,
        }
    }

    /// The numpy `dtype.str` descriptor for little-endian data, e.g. `<f4`.
    pub fn descr(self) -> &'static str {
        match self {
            DType::Bool => "|b1",
            DType::I8 => "|i1",
            DType::I16 => "<i2",
            DType::I32 => "<i4",
            DType::I64 => "<i8",
            DType::U8 => "|u1",
            DType::U16 => "<u2",
            DType::U32 => "<u4",
            DType::U64 => "<u8",
            DType::F16 => "<f2",
            DType::F32 => "<f4",
            DType::F64 => "<f8",
        }
    }

    /// Parse a numpy descriptor such as `<f4`, `>i8`, `|u1` or `=f8`.
    ///
    /// `=` and `|` are treated as little-endian.
    pub fn parse_descr(descr: &str) -> Result<(DType, ByteOrder)> {
        let unsupported = || Error::Codec(format!("Unsupported dtype: {}", descr));

        let mut chars = descr.chars();
        let (order, rest) = match chars.next() {
            Some('<') | Some('|') | Some('=') => (ByteOrder::Little, chars.as_str()),
            Some('>') => (ByteOrder::Big, chars.as_str()),
            Some(_) => (ByteOrder::Little, descr),
            None => return Err(unsupported()),
        };

        let dtype = match rest {
            "b1" | "?" => DType::Bool,
            "i1" => DType::I8,
            "i2" => DType::I16,
            "i4" => DType::I32,
            "i8" => DType::I64,
            "u1" => DType::U8,
            "u2" => DType::U16,
            "u4" => DType::U32,
            "u8" => DType::U64,
            "f2" => DType::F16,
            "f4" => DType::F32,
            "f8" => DType::F64,
            _ => return Err(unsupported()),
        };

        Ok((dtype, order))
    }
}

/// Rust primitives that map onto a [`DType`].
pub trait Element: Copy {
    const DTYPE: DType;

    fn write_le(self, out: &mut Vec<u8>);

    /// Read one element from exactly `DTYPE.itemsize()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! numeric_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }
        }
    };
}

numeric_element!(i8, DType::I8);
numeric_element!(i16, DType::I16);
numeric_element!(i32, DType::I32);
numeric_element!(i64, DType::I64);
numeric_element!(u8, DType::U8);
numeric_element!(u16, DType::U16);
numeric_element!(u32, DType::U32);
numeric_element!(u64, DType::U64);
numeric_element!(f32, DType::F32);
numeric_element!(f64, DType::F64);

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// A dense n-dimensional numeric array.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl NdArray {
    /// Build an array from typed elements in C order.
    pub fn new<T: Element>(shape: impl Into<Vec<usize>>, values: &[T]) -> Result<Self> {
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.itemsize());
        for value in values {
            value.write_le(&mut data);
        }
        Self::from_raw(T::DTYPE, shape, data)
    }

    /// Build an array from raw little-endian element bytes.
    pub fn from_raw(dtype: DType, shape: impl Into<Vec<usize>>, data: Vec<u8>) -> Result<Self> {
        let shape = shape.into();
        let expected = element_count(&shape)
            .and_then(|count| count.checked_mul(dtype.itemsize()))
            .ok_or_else(|| Error::Codec(format!("Array shape {:?} overflows", shape)))?;

        if data.len() != expected {
            return Err(Error::Codec(format!(
                "Array data is {} bytes but shape {:?} of {} needs {}",
                data.len(),
                shape,
                dtype.descr(),
                expected
            )));
        }

        Ok(Self { dtype, shape, data })
    }

    /// Build an array from raw bytes in the given byte order.
    pub(crate) fn from_ordered(
        dtype: DType,
        order: ByteOrder,
        shape: Vec<usize>,
        mut data: Vec<u8>,
    ) -> Result<Self> {
        let itemsize = dtype.itemsize();
        if order == ByteOrder::Big && itemsize > 1 {
            for chunk in data.chunks_mut(itemsize) {
                chunk.reverse();
            }
        }
        Self::from_raw(dtype, shape, data)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw little-endian element bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.itemsize()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the elements out as `T`, which must match the array dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(Error::Codec(format!(
                "Array holds {} elements, requested {}",
                self.dtype.descr(),
                T::DTYPE.descr()
            )));
        }

        Ok(self
            .data
            .chunks_exact(self.dtype.itemsize())
            .map(T::read_le)
            .collect())
    }
}

/// `None` when the product of the dimensions does not fit in `usize`.
fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}
