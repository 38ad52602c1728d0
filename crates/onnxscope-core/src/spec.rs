use std::fmt;

use crate::{write_dims, DType, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

impl fmt::Display for IOName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An engine-declared input or output.
#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: DType,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Concrete shape with every dynamic dimension replaced by `fill`.
    pub fn concrete_shape(&self, fill: usize) -> Shape {
        let dims: Vec<usize> = self.dims.iter().map(|d| d.unwrap_or(fill)).collect();
        Shape::from_slice(&dims)
    }

    pub fn is_dynamic(&self) -> bool {
        self.dims.iter().any(Option::is_none)
    }

    /// Dims rendered as `[1, ?, 224]`.
    pub fn dims_display(&self) -> String {
        let mut out = String::new();
        let _ = write_dims(
            &mut out,
            self.dims.iter().map(|d| match d {
                Some(d) => d.to_string(),
                None => "?".to_string(),
            }),
        );
        out
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}
