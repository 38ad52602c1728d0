#![allow(dead_code)]

use std::io::Write;

use anyhow::Result;
use onnxscope_proto::{
    tensor_shape_proto::{dimension::Value as DimValue, Dimension},
    type_proto, GraphProto, Message, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};
use tempfile::NamedTempFile;

pub const FLOAT: i32 = 1;
pub const INT64: i32 = 7;

pub enum D {
    V(i64),
    P(&'static str),
    Unset,
}

pub fn value(name: &str, elem_type: i32, dims: &[D]) -> ValueInfoProto {
    let dim = dims
        .iter()
        .map(|d| Dimension {
            denotation: String::new(),
            value: match d {
                D::V(v) => Some(DimValue::DimValue(*v)),
                D::P(p) => Some(DimValue::DimParam(p.to_string())),
                D::Unset => None,
            },
        })
        .collect();

    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            denotation: String::new(),
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type,
                shape: Some(TensorShapeProto { dim }),
            })),
        }),
        doc_string: String::new(),
    }
}

pub fn node(op_type: &str, inputs: &[&str], outputs: &[&str]) -> NodeProto {
    NodeProto {
        op_type: op_type.to_string(),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

pub fn initializer(name: &str, data_type: i32, dims: &[i64]) -> TensorProto {
    let numel: i64 = dims.iter().product();
    TensorProto {
        name: name.to_string(),
        data_type,
        dims: dims.to_vec(),
        float_data: vec![0.5; numel.max(0) as usize],
        ..Default::default()
    }
}

pub fn model(graph: GraphProto) -> ModelProto {
    ModelProto {
        ir_version: 8,
        producer_name: "onnxscope-tests".to_string(),
        producer_version: "0.1".to_string(),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 17,
        }],
        graph: Some(graph),
        ..Default::default()
    }
}

/// `x[1,3,224,224] f32 -> Relu -> y[1,3,224,224] f32`
pub fn relu_model() -> ModelProto {
    let dims = [D::V(1), D::V(3), D::V(224), D::V(224)];
    model(GraphProto {
        name: "relu".to_string(),
        input: vec![value("x", FLOAT, &dims)],
        output: vec![value("y", FLOAT, &dims)],
        node: vec![node("Relu", &["x"], &["y"])],
        ..Default::default()
    })
}

/// A chain of `n` `Add` nodes, each adding its own `[4]` weight.
pub fn chain_model(n: usize) -> ModelProto {
    let mut graph = GraphProto {
        name: "chain".to_string(),
        input: vec![value("v0", FLOAT, &[D::V(4)])],
        output: vec![value(&format!("v{n}"), FLOAT, &[D::V(4)])],
        ..Default::default()
    };
    for i in 0..n {
        let w = format!("w{i}");
        graph.initializer.push(initializer(&w, FLOAT, &[4]));
        let input = format!("v{i}");
        let output = format!("v{}", i + 1);
        graph
            .node
            .push(node("Add", &[input.as_str(), w.as_str()], &[output.as_str()]));
    }
    model(graph)
}

pub fn write_bytes(bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".onnx").tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

pub fn write_model(model: &ModelProto) -> Result<NamedTempFile> {
    write_bytes(&model.encode_to_vec())
}
