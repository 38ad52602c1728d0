//! One zero-filled evaluation through an inference engine.

use std::fmt::Write;
use std::path::Path;

use anyhow::{anyhow, Context};
use onnxscope_core::{
    Backend, BackendModel, DType, Device, ModelSpec, Tensor, TensorDesc, TensorSpec,
};
use tracing::{debug, info};

use crate::InspectError;

/// Size used for every dynamic dimension of a dummy input.
pub const DYNAMIC_DIM_FILL: usize = 1;

#[derive(Clone, Debug)]
pub struct DummyRun {
    pub providers: Vec<String>,
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
    /// Shape and dtype of each returned tensor, in return order.
    pub results: Vec<TensorDesc>,
}

/// Zero tensors matching each input spec, in spec order. Undefined element
/// types fall back to `float32`.
pub fn zero_inputs(spec: &ModelSpec) -> anyhow::Result<Vec<Tensor>> {
    spec.inputs
        .iter()
        .map(|input| -> anyhow::Result<Tensor> {
            let dtype = match input.dtype {
                DType::Undefined => DType::F32,
                other => other,
            };
            let shape = input.concrete_shape(DYNAMIC_DIM_FILL);
            let tensor = Tensor::zeros(dtype, shape).with_context(|| {
                format!("cannot build dummy value for input '{}'", input.name)
            })?;
            debug!(
                input = %input.name,
                %dtype,
                rank = input.rank(),
                dynamic = input.is_dynamic(),
                shape = %tensor.desc.shape,
                bytes = tensor.byte_len(),
                "built zero input"
            );
            Ok(tensor)
        })
        .collect()
}

pub fn run_dummy_inference<M>(
    model: &mut M,
    providers: Vec<String>,
) -> Result<DummyRun, InspectError>
where
    M: BackendModel + ?Sized,
{
    let spec = model.spec().clone();
    let inputs = zero_inputs(&spec).map_err(InspectError::Engine)?;

    info!(inputs = inputs.len(), "running dummy inference");
    let results = model.infer_descs(inputs).map_err(InspectError::Engine)?;

    Ok(DummyRun {
        providers,
        inputs: spec.inputs,
        outputs: spec.outputs,
        results,
    })
}

/// Opens `path` with `backend` and runs it once.
pub fn run_with_backend<B: Backend>(
    backend: &B,
    path: &Path,
    device: Device,
) -> Result<DummyRun, InspectError> {
    let providers = backend.providers().map_err(InspectError::Engine)?;
    if providers.is_empty() {
        return Err(InspectError::Engine(anyhow!(
            "{} reports no available execution provider",
            backend.name()
        )));
    }

    let mut model = backend
        .load(path, device)
        .with_context(|| format!("{} could not open {}", backend.name(), path.display()))
        .map_err(InspectError::Engine)?;

    run_dummy_inference(&mut model, providers)
}

fn write_specs(out: &mut String, title: &str, specs: &[TensorSpec]) -> std::fmt::Result {
    writeln!(out, "=== {title} ===")?;
    for spec in specs {
        writeln!(
            out,
            "  {}\tshape={}\tdtype={}",
            spec.name,
            spec.dims_display(),
            spec.dtype
        )?;
    }
    writeln!(out)
}

fn write_dummy_run(out: &mut String, run: &DummyRun) -> std::fmt::Result {
    writeln!(out, "Providers: {}", run.providers.join(", "))?;
    writeln!(out)?;
    write_specs(out, "Session Inputs", &run.inputs)?;
    write_specs(out, "Session Outputs", &run.outputs)?;
    writeln!(out, "=== Dummy Inference ===")?;
    for (idx, desc) in run.results.iter().enumerate() {
        writeln!(
            out,
            "  Output[{idx}]: shape={} dtype={}",
            desc.shape, desc.dtype
        )?;
    }
    writeln!(out)
}

pub fn report_dummy_run(run: &DummyRun) -> String {
    let mut out = String::new();
    // fmt::Write for String never fails.
    let _ = write_dummy_run(&mut out, run);
    out
}
