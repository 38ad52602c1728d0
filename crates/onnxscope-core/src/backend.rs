use std::path::Path;

use anyhow::Result;

use crate::{Device, ModelSpec, Tensor, TensorDesc};

/// An inference engine able to open model files.
pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    fn load(&self, path: &Path, device: Device) -> Result<Self::Model>;

    /// Execution providers this build can use, in preference order.
    fn providers(&self) -> Result<Vec<String>>;
}

pub trait BackendModel: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// Inputs are given in `spec().inputs` order; outputs come back in the
    /// order the engine returns them.
    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>>;

    /// Like [`infer`](Self::infer), but only the element type and shape of
    /// each output are returned. Engines that can read those without copying
    /// the payload should override this.
    fn infer_descs(&mut self, inputs: Vec<Tensor>) -> Result<Vec<TensorDesc>> {
        Ok(self.infer(inputs)?.into_iter().map(|t| t.desc).collect())
    }
}
