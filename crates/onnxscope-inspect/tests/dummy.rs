use std::path::Path;

use anyhow::{bail, Result};
use onnxscope_core::{
    Backend, BackendModel, DType, Device, IOName, ModelSpec, Shape, Tensor, TensorSpec,
};
use onnxscope_inspect::{
    report_dummy_run, run_dummy_inference, run_with_backend, zero_inputs, InspectError,
};

fn spec(name: &str, dtype: DType, dims: Vec<Option<usize>>) -> TensorSpec {
    TensorSpec {
        name: IOName(name.to_string()),
        dtype,
        dims,
    }
}

/// Echoes each input back, then appends a fixed `[2, 5]` int64 tensor.
struct EchoModel {
    spec: ModelSpec,
    seen: Vec<Tensor>,
}

impl BackendModel for EchoModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        self.seen = inputs.clone();
        let mut outputs = inputs;
        outputs.push(Tensor::zeros(DType::I64, Shape::from_slice(&[2, 5]))?);
        Ok(outputs)
    }
}

struct FailingModel {
    spec: ModelSpec,
}

impl BackendModel for FailingModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn infer(&mut self, _inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        bail!("kernel exploded")
    }
}

struct NoProviderBackend;

impl Backend for NoProviderBackend {
    type Model = FailingModel;

    fn name(&self) -> &'static str {
        "none"
    }

    fn load(&self, _path: &Path, _device: Device) -> Result<Self::Model> {
        bail!("should not be reached")
    }

    fn providers(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

fn echo_model() -> EchoModel {
    EchoModel {
        spec: ModelSpec {
            inputs: vec![
                spec("image", DType::F32, vec![None, Some(3), Some(4), Some(4)]),
                spec("ids", DType::I64, vec![Some(7)]),
                spec("mask", DType::Undefined, vec![Some(2), None]),
            ],
            outputs: vec![spec("out", DType::F32, vec![None, Some(3), Some(4), Some(4)])],
        },
        seen: Vec::new(),
    }
}

#[test]
fn zero_inputs_fill_dynamic_dims_with_one() -> Result<()> {
    let inputs = zero_inputs(&echo_model().spec)?;
    assert_eq!(inputs.len(), 3);
    assert_eq!(inputs[0].desc.shape.dims(), &[1, 3, 4, 4]);
    assert_eq!(inputs[0].byte_len(), 48 * 4);
    assert_eq!(inputs[1].desc.dtype, DType::I64);
    assert_eq!(inputs[2].desc.dtype, DType::F32);
    assert_eq!(inputs[2].desc.shape.dims(), &[2, 1]);
    assert!(inputs.iter().all(|t| t.data.iter().all(|b| *b == 0)));
    Ok(())
}

#[test]
fn results_match_returned_tensors() -> Result<()> {
    let mut model = echo_model();
    let run = run_dummy_inference(&mut model, vec!["CPUExecutionProvider".to_string()])?;

    assert_eq!(model.seen.len(), 3);
    assert_eq!(run.results.len(), 4);
    assert_eq!(run.results[3].shape, Shape::from_slice(&[2, 5]));

    let report = report_dummy_run(&run);
    let result_lines: Vec<&str> = report
        .lines()
        .filter(|l| l.trim_start().starts_with("Output["))
        .collect();
    assert_eq!(result_lines.len(), run.results.len());
    assert_eq!(result_lines[0], "  Output[0]: shape=[1, 3, 4, 4] dtype=float32");
    assert_eq!(result_lines[3], "  Output[3]: shape=[2, 5] dtype=int64");

    assert!(report.starts_with("Providers: CPUExecutionProvider\n"));
    assert!(report.contains("  image\tshape=[?, 3, 4, 4]\tdtype=float32\n"));
    assert!(report.contains("  mask\tshape=[2, ?]\tdtype=undefined\n"));
    Ok(())
}

#[test]
fn evaluation_failure_is_an_engine_error() {
    let mut model = FailingModel {
        spec: echo_model().spec,
    };
    let err = run_dummy_inference(&mut model, Vec::new()).unwrap_err();
    match err {
        InspectError::Engine(inner) => assert!(format!("{inner:#}").contains("kernel exploded")),
        other => panic!("expected engine error, got {other:?}"),
    }
}

#[test]
fn string_inputs_cannot_be_zero_filled() {
    let mut model = FailingModel {
        spec: ModelSpec {
            inputs: vec![spec("text", DType::String, vec![Some(1)])],
            outputs: Vec::new(),
        },
    };
    let err = run_dummy_inference(&mut model, Vec::new()).unwrap_err();
    assert!(matches!(err, InspectError::Engine(_)));
}

#[test]
fn backend_without_providers_is_an_engine_error() {
    let err = run_with_backend(&NoProviderBackend, Path::new("model.onnx"), Device::Cpu)
        .unwrap_err();
    match err {
        InspectError::Engine(inner) => {
            assert!(inner.to_string().contains("no available execution provider"))
        }
        other => panic!("expected engine error, got {other:?}"),
    }
}

#[test]
fn oversized_input_is_an_engine_error() {
    let mut model = FailingModel {
        spec: ModelSpec {
            inputs: vec![spec("x", DType::F32, vec![Some(1 << 40), None, Some(1 << 40)])],
            outputs: Vec::new(),
        },
    };
    let err = run_dummy_inference(&mut model, Vec::new()).unwrap_err();
    match err {
        InspectError::Engine(inner) => {
            let chain = format!("{inner:#}");
            assert!(chain.contains("input 'x'"), "{chain}");
            assert!(chain.contains("too large"), "{chain}");
        }
        other => panic!("expected engine error, got {other:?}"),
    }
}
