use std::fmt;

use anyhow::{bail, Result};
use bytes::Bytes;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

/// Tensor element types, numbered as in `TensorProto.DataType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Undefined,
    F32,
    U8,
    I8,
    U16,
    I16,
    I32,
    I64,
    String,
    Bool,
    F16,
    F64,
    U32,
    U64,
    Complex64,
    Complex128,
    BF16,
}

impl DType {
    pub const ALL: [DType; 17] = [
        DType::Undefined,
        DType::F32,
        DType::U8,
        DType::I8,
        DType::U16,
        DType::I16,
        DType::I32,
        DType::I64,
        DType::String,
        DType::Bool,
        DType::F16,
        DType::F64,
        DType::U32,
        DType::U64,
        DType::Complex64,
        DType::Complex128,
        DType::BF16,
    ];

    pub fn from_onnx_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Human-readable label, numpy style.
    pub fn label(self) -> &'static str {
        match self {
            DType::Undefined => "undefined",
            DType::F32 => "float32",
            DType::U8 => "uint8",
            DType::I8 => "int8",
            DType::U16 => "uint16",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::String => "string",
            DType::Bool => "bool",
            DType::F16 => "float16",
            DType::F64 => "float64",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
            DType::BF16 => "bfloat16",
        }
    }

    /// Bytes per element for fixed-width types.
    pub fn byte_size(self) -> Option<usize> {
        match self {
            DType::U8 | DType::I8 | DType::Bool => Some(1),
            DType::U16 | DType::I16 | DType::F16 | DType::BF16 => Some(2),
            DType::F32 | DType::I32 | DType::U32 => Some(4),
            DType::F64 | DType::I64 | DType::U64 | DType::Complex64 => Some(8),
            DType::Complex128 => Some(16),
            DType::Undefined | DType::String => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for a raw `TensorProto.DataType` code. Codes outside the table map
/// to `"unknown"`.
pub fn dtype_label(code: i32) -> &'static str {
    DType::from_onnx_code(code).map_or("unknown", DType::label)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    /// Element count, or `None` if it does not fit in `usize`. A rank-0 shape
    /// holds one scalar.
    pub fn numel(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
    }
    /// Payload size for elements of `dtype`, when fixed-width and representable.
    pub fn byte_len(&self, dtype: DType) -> Option<usize> {
        self.numel()?.checked_mul(dtype.byte_size()?)
    }
    pub fn dims(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dims(f, self.0.iter())
    }
}

/// Writes `[a, b, c]`.
pub fn write_dims<I, T>(f: &mut impl fmt::Write, dims: I) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    f.write_char('[')?;
    for (idx, dim) in dims.into_iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{dim}")?;
    }
    f.write_char(']')
}

#[derive(Clone, Debug)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
}

/// A dense CPU tensor: element type, shape and little-endian bytes.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub data: Bytes,
}

impl Tensor {
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            desc: TensorDesc { dtype, shape },
            data: bytes,
        }
    }

    /// A tensor of the given shape with every element zero (`false` for bool).
    pub fn zeros(dtype: DType, shape: Shape) -> Result<Self> {
        let Some(width) = dtype.byte_size() else {
            bail!("cannot zero-fill a {dtype} tensor");
        };
        let Some(byte_len) = shape.numel().and_then(|n| n.checked_mul(width)) else {
            bail!("{dtype} tensor of shape {shape} is too large to allocate");
        };
        let mut data = Vec::new();
        if data.try_reserve_exact(byte_len).is_err() {
            bail!("cannot allocate {byte_len} bytes for a {dtype} tensor of shape {shape}");
        }
        data.resize(byte_len, 0u8);
        Ok(Self::from_cpu_bytes(dtype, shape, Bytes::from(data)))
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}
