use std::fs;
use std::path::Path;

use onnxscope_proto::{DecodeError, Message, ModelProto};
use tracing::{debug, info};

use crate::{checker, InspectError};

/// Reads, decodes and structurally checks the model at `path`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ModelProto, InspectError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| InspectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read model file");

    let model = decode_model(&bytes).map_err(|err| InspectError::MalformedModel {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    // Protobuf happily decodes many byte strings to an all-default message.
    if model.ir_version == 0 && model.graph.is_none() {
        return Err(InspectError::MalformedModel {
            path: path.to_path_buf(),
            reason: "no ModelProto fields found".to_string(),
        });
    }

    checker::check_model(&model)?;
    info!(
        path = %path.display(),
        ir_version = model.ir_version,
        producer = %model.producer_name,
        "loaded model"
    );
    Ok(model)
}

pub fn decode_model(bytes: &[u8]) -> Result<ModelProto, DecodeError> {
    ModelProto::decode(bytes)
}
