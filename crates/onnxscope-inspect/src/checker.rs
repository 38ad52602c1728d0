//! Structural validation of a decoded model.
//!
//! The rules mirror the graph-level part of the reference ONNX checker:
//! single assignment of value names, resolvable node inputs, produced graph
//! outputs, an opset import for the default domain and initializer payloads
//! that match their dims. Operator schemas are not checked.

use std::collections::HashSet;

use onnxscope_core::DType;
use onnxscope_proto::{
    GraphProto, ModelProto, OperatorSetIdProto, TensorProto, DEFAULT_DOMAIN,
};
use tracing::debug;

use crate::InspectError;

pub fn check_model(model: &ModelProto) -> Result<(), InspectError> {
    if model.ir_version <= 0 {
        return Err(InspectError::violation(format!(
            "ir_version must be positive, got {}",
            model.ir_version
        )));
    }

    let Some(graph) = model.graph.as_ref() else {
        return Err(InspectError::violation("model has no graph"));
    };

    check_graph(graph, &model.opset_import)?;
    debug!(
        nodes = graph.node.len(),
        initializers = graph.initializer.len(),
        "model passed structural check"
    );
    Ok(())
}

fn is_default_domain(domain: &str) -> bool {
    domain.is_empty() || domain == DEFAULT_DOMAIN
}

fn check_graph(graph: &GraphProto, opsets: &[OperatorSetIdProto]) -> Result<(), InspectError> {
    // Every value name defined so far: graph inputs, initializers, node outputs.
    let mut defined: HashSet<&str> = HashSet::new();

    let mut input_names = HashSet::new();
    for (idx, input) in graph.input.iter().enumerate() {
        if input.name.is_empty() {
            return Err(InspectError::violation(format!(
                "graph input #{idx} has an empty name"
            )));
        }
        if !input_names.insert(input.name.as_str()) {
            return Err(InspectError::violation(format!(
                "graph input '{}' is declared more than once",
                input.name
            )));
        }
        defined.insert(input.name.as_str());
    }

    let mut initializer_names = HashSet::new();
    for (idx, init) in graph.initializer.iter().enumerate() {
        if init.name.is_empty() {
            return Err(InspectError::violation(format!(
                "initializer #{idx} has an empty name"
            )));
        }
        if !initializer_names.insert(init.name.as_str()) {
            return Err(InspectError::violation(format!(
                "initializer '{}' is declared more than once",
                init.name
            )));
        }
        if let Some(dim) = init.dims.iter().find(|d| **d < 0) {
            return Err(InspectError::violation(format!(
                "initializer '{}' has negative dimension {dim}",
                init.name
            )));
        }
        check_payload(init)?;
        // Initializers may double as graph inputs (default values).
        defined.insert(init.name.as_str());
    }

    let imports_default = opsets.iter().any(|o| is_default_domain(&o.domain));

    for (idx, node) in graph.node.iter().enumerate() {
        if node.op_type.is_empty() {
            return Err(InspectError::violation(format!(
                "node #{idx} has an empty op_type"
            )));
        }
        if is_default_domain(&node.domain) && !imports_default {
            return Err(InspectError::violation(format!(
                "node #{idx} ({}) uses the default operator set but the model imports no opset for it",
                node.op_type
            )));
        }

        // Empty names mark omitted optional inputs.
        for name in node.input.iter().filter(|n| !n.is_empty()) {
            if !defined.contains(name.as_str()) {
                return Err(InspectError::violation(format!(
                    "node #{idx} ({}) input '{name}' is not a graph input, an initializer, \
                     or an output of an earlier node",
                    node.op_type
                )));
            }
        }

        for name in node.output.iter().filter(|n| !n.is_empty()) {
            if !defined.insert(name.as_str()) {
                return Err(InspectError::violation(format!(
                    "node #{idx} ({}) output '{name}' is assigned more than once",
                    node.op_type
                )));
            }
        }
    }

    let mut output_names = HashSet::new();
    for (idx, output) in graph.output.iter().enumerate() {
        if output.name.is_empty() {
            return Err(InspectError::violation(format!(
                "graph output #{idx} has an empty name"
            )));
        }
        if !output_names.insert(output.name.as_str()) {
            return Err(InspectError::violation(format!(
                "graph output '{}' is declared more than once",
                output.name
            )));
        }
        if !defined.contains(output.name.as_str()) {
            return Err(InspectError::violation(format!(
                "graph output '{}' is not produced by any node",
                output.name
            )));
        }
    }

    Ok(())
}

/// `TensorProto.DataLocation.EXTERNAL`.
const EXTERNAL_DATA: i32 = 1;

/// Checks that an inline initializer payload holds exactly as many values as
/// its dims describe. Externally stored payloads are not read.
fn check_payload(init: &TensorProto) -> Result<(), InspectError> {
    let numel = init
        .dims
        .iter()
        .try_fold(1u64, |acc, d| acc.checked_mul(u64::try_from(*d).ok()?))
        .ok_or_else(|| {
            InspectError::violation(format!(
                "initializer '{}' has an element count that overflows u64",
                init.name
            ))
        })?;

    if init.data_location == Some(EXTERNAL_DATA) || !init.external_data.is_empty() {
        return Ok(());
    }

    let dtype = DType::from_onnx_code(init.data_type);
    // Complex values are stored as interleaved real/imaginary pairs.
    let per_element: u64 = match dtype {
        Some(DType::Complex64 | DType::Complex128) => 2,
        _ => 1,
    };

    let typed = [
        ("float_data", init.float_data.len()),
        ("int32_data", init.int32_data.len()),
        ("string_data", init.string_data.len()),
        ("int64_data", init.int64_data.len()),
        ("double_data", init.double_data.len()),
        ("uint64_data", init.uint64_data.len()),
    ];
    let mut fields = typed.iter().filter(|(_, len)| *len > 0);
    let raw = !init.raw_data.is_empty();

    let (field, found, expected) = match (fields.next(), fields.next(), raw) {
        (None, None, false) if numel == 0 => return Ok(()),
        (None, None, false) => {
            return Err(InspectError::violation(format!(
                "initializer '{}' has dims for {numel} values but no data",
                init.name
            )));
        }
        (None, None, true) => {
            // Variable-width and unknown types cannot be sized from raw bytes.
            let Some(width) = dtype.and_then(DType::byte_size) else {
                return Ok(());
            };
            let expected = numel.checked_mul(width as u64);
            ("raw_data bytes", init.raw_data.len() as u64, expected)
        }
        (Some((name, len)), None, false) => (*name, *len as u64, numel.checked_mul(per_element)),
        _ => {
            return Err(InspectError::violation(format!(
                "initializer '{}' stores its values in more than one field",
                init.name
            )));
        }
    };

    if expected != Some(found) {
        return Err(InspectError::violation(format!(
            "initializer '{}' holds {found} {field} but its dims {:?} need {}",
            init.name,
            init.dims,
            expected.map_or_else(|| "more than u64::MAX".to_string(), |n| n.to_string())
        )));
    }
    Ok(())
}
