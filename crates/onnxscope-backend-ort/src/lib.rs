use std::fmt::Debug;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use bytes::Bytes;
use half::{bf16, f16};
use onnxscope_core::{
    Backend, BackendModel, DType, Device, IOName, ModelSpec, Shape, Tensor, TensorDesc,
    TensorSpec,
};
use ort::{
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session, SessionInputValue,
    },
    tensor::{PrimitiveTensorElementType, TensorElementType},
    value::{DynValue, ValueRef, ValueType},
};
use tracing::{debug, info};

pub const CPU_PROVIDER: &str = "CPUExecutionProvider";
pub const CUDA_PROVIDER: &str = "CUDAExecutionProvider";

pub struct OrtBackend;

impl OrtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OrtModel {
    spec: ModelSpec,
    session: Session,
    input_names: Vec<String>,
}

impl Backend for OrtBackend {
    type Model = OrtModel;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load(&self, path: &Path, device: Device) -> Result<Self::Model> {
        let builder = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .context("failed to configure ORT session builder")?;

        let builder = configure_session_builder(builder, &device)?;

        let session = builder
            .commit_from_file(path)
            .context("failed to load ONNX model")?;

        let input_names = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();

        let spec = build_model_spec(&session)?;
        info!(
            path = %path.display(),
            ?device,
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            "ORT session ready"
        );

        Ok(OrtModel {
            spec,
            session,
            input_names,
        })
    }

    fn providers(&self) -> Result<Vec<String>> {
        let mut providers = Vec::new();
        #[cfg(feature = "cuda")]
        {
            use ort::execution_providers::{cuda::CUDAExecutionProvider, ExecutionProvider};
            if CUDAExecutionProvider::default()
                .is_available()
                .unwrap_or(false)
            {
                providers.push(CUDA_PROVIDER.to_string());
            }
        }
        providers.push(CPU_PROVIDER.to_string());
        Ok(providers)
    }
}

impl BackendModel for OrtModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        let ort_inputs = self.ort_inputs(inputs)?;
        let outputs = self.session.run(ort_inputs).context("ORT evaluation failed")?;
        let mut out_tensors = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            let tensor = ort_value_to_tensor(&value)
                .with_context(|| format!("cannot read output '{name}'"))?;
            debug!(output = name, shape = %tensor.desc.shape, "output tensor");
            out_tensors.push(tensor);
        }

        Ok(out_tensors)
    }

    fn infer_descs(&mut self, inputs: Vec<Tensor>) -> Result<Vec<TensorDesc>> {
        let ort_inputs = self.ort_inputs(inputs)?;
        let outputs = self.session.run(ort_inputs).context("ORT evaluation failed")?;
        outputs
            .iter()
            .map(|(name, value)| {
                ort_value_desc(&value).with_context(|| format!("cannot read output '{name}'"))
            })
            .collect()
    }
}

impl OrtModel {
    fn ort_inputs(
        &self,
        inputs: Vec<Tensor>,
    ) -> Result<Vec<(String, SessionInputValue<'static>)>> {
        ensure!(
            inputs.len() == self.input_names.len(),
            "expected {} inputs, got {}",
            self.input_names.len(),
            inputs.len()
        );

        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, input) in self.input_names.iter().zip(inputs) {
            let value = tensor_to_ort_value(input)
                .with_context(|| format!("cannot convert input '{name}'"))?;
            ort_inputs.push((name.clone(), SessionInputValue::from(value)));
        }
        Ok(ort_inputs)
    }
}

fn build_model_spec(session: &Session) -> Result<ModelSpec> {
    let inputs = session
        .inputs
        .iter()
        .map(|input| tensor_spec_from_value_type(&input.name, &input.input_type))
        .collect::<Result<Vec<_>>>()?;

    let outputs = session
        .outputs
        .iter()
        .map(|output| tensor_spec_from_value_type(&output.name, &output.output_type))
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelSpec { inputs, outputs })
}

fn configure_session_builder(builder: SessionBuilder, device: &Device) -> Result<SessionBuilder> {
    match device {
        Device::Cpu => Ok(builder),
        Device::Cuda { device_id } => configure_cuda(builder, *device_id),
    }
}

fn configure_cuda(builder: SessionBuilder, device_id: u32) -> Result<SessionBuilder> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::cuda::CUDAExecutionProvider;
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32)
            .build();
        builder
            .with_execution_providers([ep])
            .context("failed to enable ORT CUDA execution provider")
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = (builder, device_id);
        bail!("CUDA requested but onnxscope-backend-ort was built without the `cuda` feature")
    }
}

fn tensor_spec_from_value_type(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        bail!("'{name}' is not a tensor; sequence and map IO are unsupported");
    };

    let dims = shape
        .iter()
        .map(|d| usize::try_from(*d).ok())
        .collect::<Vec<_>>();

    Ok(TensorSpec {
        name: IOName(name.to_string()),
        dtype: ort_element_to_dtype(*ty),
        dims,
    })
}

fn ort_element_to_dtype(ty: TensorElementType) -> DType {
    match ty {
        TensorElementType::Float32 => DType::F32,
        TensorElementType::Float64 => DType::F64,
        TensorElementType::Float16 => DType::F16,
        TensorElementType::Bfloat16 => DType::BF16,
        TensorElementType::Int8 => DType::I8,
        TensorElementType::Int16 => DType::I16,
        TensorElementType::Int32 => DType::I32,
        TensorElementType::Int64 => DType::I64,
        TensorElementType::Uint8 => DType::U8,
        TensorElementType::Uint16 => DType::U16,
        TensorElementType::Uint32 => DType::U32,
        TensorElementType::Uint64 => DType::U64,
        TensorElementType::Bool => DType::Bool,
        TensorElementType::String => DType::String,
        _ => DType::Undefined,
    }
}

fn decode_le<const N: usize, T>(bytes: &Bytes, from_le: fn([u8; N]) -> T) -> Result<Vec<T>> {
    ensure!(
        bytes.len() % N == 0,
        "input byte length {} is not a multiple of {N}",
        bytes.len()
    );
    Ok(bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(chunk);
            from_le(buf)
        })
        .collect())
}

fn ort_tensor<T>(shape: Vec<usize>, data: Vec<T>) -> Result<DynValue>
where
    T: PrimitiveTensorElementType + Clone + Debug + 'static,
{
    Ok(ort::value::Tensor::from_array((shape, data))?.into_dyn())
}

fn tensor_to_ort_value(tensor: Tensor) -> Result<DynValue> {
    let dtype = tensor.desc.dtype;
    let Some(expected_bytes) = tensor.desc.shape.byte_len(dtype) else {
        bail!(
            "{dtype} input of shape {} has no representable byte size",
            tensor.desc.shape
        );
    };
    ensure!(
        tensor.data.len() == expected_bytes,
        "input byte size mismatch: got {}, expected {}",
        tensor.data.len(),
        expected_bytes
    );

    let shape = tensor.desc.shape.dims().to_vec();
    let bytes = &tensor.data;
    match dtype {
        DType::F32 => ort_tensor(shape, decode_le(bytes, f32::from_le_bytes)?),
        DType::F64 => ort_tensor(shape, decode_le(bytes, f64::from_le_bytes)?),
        DType::F16 => ort_tensor(shape, decode_le(bytes, f16::from_le_bytes)?),
        DType::BF16 => ort_tensor(shape, decode_le(bytes, bf16::from_le_bytes)?),
        DType::I8 => ort_tensor(shape, decode_le(bytes, i8::from_le_bytes)?),
        DType::I16 => ort_tensor(shape, decode_le(bytes, i16::from_le_bytes)?),
        DType::I32 => ort_tensor(shape, decode_le(bytes, i32::from_le_bytes)?),
        DType::I64 => ort_tensor(shape, decode_le(bytes, i64::from_le_bytes)?),
        DType::U8 => ort_tensor(shape, bytes.to_vec()),
        DType::U16 => ort_tensor(shape, decode_le(bytes, u16::from_le_bytes)?),
        DType::U32 => ort_tensor(shape, decode_le(bytes, u32::from_le_bytes)?),
        DType::U64 => ort_tensor(shape, decode_le(bytes, u64::from_le_bytes)?),
        DType::Bool => ort_tensor(shape, bytes.iter().map(|b| *b != 0).collect::<Vec<_>>()),
        other => bail!("{other} inputs are not supported yet"),
    }
}

fn extract_bytes<T>(value: &ValueRef<'_>) -> Result<Bytes>
where
    T: PrimitiveTensorElementType + Clone + Debug + 'static,
{
    let array = value.try_extract_array::<T>()?;
    let slice = array.as_slice().context("non-contiguous output tensor")?;
    Ok(bytes_from_slice(slice))
}

/// Element type and shape of an output, read without touching its payload.
fn ort_value_desc(value: &ValueRef<'_>) -> Result<TensorDesc> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        bail!("non-tensor outputs are not supported");
    };

    let dims: Vec<usize> = shape
        .iter()
        .map(|d| usize::try_from(*d).unwrap_or(0))
        .collect();
    Ok(TensorDesc {
        dtype: ort_element_to_dtype(*ty),
        shape: Shape::from_slice(&dims),
    })
}

fn ort_value_to_tensor(value: &ValueRef<'_>) -> Result<Tensor> {
    let desc = ort_value_desc(value)?;

    let data = match desc.dtype {
        DType::F32 => extract_bytes::<f32>(value)?,
        DType::F64 => extract_bytes::<f64>(value)?,
        DType::F16 => extract_bytes::<f16>(value)?,
        DType::BF16 => extract_bytes::<bf16>(value)?,
        DType::I8 => extract_bytes::<i8>(value)?,
        DType::I16 => extract_bytes::<i16>(value)?,
        DType::I32 => extract_bytes::<i32>(value)?,
        DType::I64 => extract_bytes::<i64>(value)?,
        DType::U8 => extract_bytes::<u8>(value)?,
        DType::U16 => extract_bytes::<u16>(value)?,
        DType::U32 => extract_bytes::<u32>(value)?,
        DType::U64 => extract_bytes::<u64>(value)?,
        DType::Bool => extract_bytes::<bool>(value)?,
        other => bail!("cannot copy out {other} output tensors"),
    };

    Ok(Tensor { desc, data })
}

fn bytes_from_slice<T>(slice: &[T]) -> Bytes {
    let byte_len = std::mem::size_of_val(slice);
    let ptr = slice.as_ptr().cast::<u8>();
    let bytes = unsafe { std::slice::from_raw_parts(ptr, byte_len) };
    Bytes::copy_from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_le_reads_little_endian() {
        let bytes = Bytes::from_static(&[1, 0, 0, 0, 0, 0, 128, 63]);
        assert_eq!(decode_le(&bytes, i32::from_le_bytes).unwrap(), vec![1, 1065353216]);
        assert_eq!(decode_le(&bytes, f32::from_le_bytes).unwrap()[1], 1.0);
    }

    #[test]
    fn decode_le_rejects_ragged_input() {
        let bytes = Bytes::from_static(&[0, 0, 0]);
        assert!(decode_le(&bytes, f32::from_le_bytes).is_err());
    }

    #[test]
    fn cpu_provider_is_always_listed() {
        let providers = OrtBackend::new().providers().unwrap();
        assert_eq!(providers.last().map(String::as_str), Some(CPU_PROVIDER));
    }

    #[test]
    fn decode_le_reads_half_precision() {
        let bytes = Bytes::from_static(&[0x00, 0x3c, 0x80, 0x3f]);
        assert_eq!(
            decode_le(&bytes, f16::from_le_bytes).unwrap(),
            vec![f16::from_f32(1.0), f16::from_f32(1.875)]
        );
        let bytes = Bytes::from_static(&[0x80, 0x3f]);
        assert_eq!(
            decode_le(&bytes, bf16::from_le_bytes).unwrap(),
            vec![bf16::from_f32(1.0)]
        );
    }

    #[test]
    fn oversized_input_is_rejected_before_conversion() {
        let tensor = Tensor::from_cpu_bytes(
            DType::F32,
            Shape::from_slice(&[1 << 40, 1 << 40]),
            Bytes::new(),
        );
        let err = tensor_to_ort_value(tensor).unwrap_err();
        assert!(err.to_string().contains("no representable byte size"), "{err}");
    }

    #[test]
    fn element_types_map_to_dtypes() {
        assert_eq!(ort_element_to_dtype(TensorElementType::Float16), DType::F16);
        assert_eq!(ort_element_to_dtype(TensorElementType::Bfloat16), DType::BF16);
        assert_eq!(ort_element_to_dtype(TensorElementType::Float32), DType::F32);
        assert_eq!(ort_element_to_dtype(TensorElementType::Int64), DType::I64);
        assert_eq!(ort_element_to_dtype(TensorElementType::Bool), DType::Bool);
        assert_eq!(ort_element_to_dtype(TensorElementType::String), DType::String);
    }
}
