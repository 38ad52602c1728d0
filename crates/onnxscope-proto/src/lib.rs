pub mod onnx;

pub use onnx::{
    GraphProto, ModelProto, NodeProto, OperatorSetIdProto, StringStringEntryProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};
pub use onnx::{tensor_shape_proto, type_proto};
pub use prost::{DecodeError, Message};

/// Domain string ONNX uses for its default operator set.
pub const DEFAULT_DOMAIN: &str = "ai.onnx";

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_shape_proto::dimension::Value as Dim;

    #[test]
    fn model_proto_default_is_empty() {
        let model = ModelProto::default();
        assert_eq!(model.ir_version, 0);
        assert!(model.graph.is_none());
        assert!(model.opset_import.is_empty());
    }

    #[test]
    fn decodes_what_it_encodes() {
        let model = ModelProto {
            ir_version: 8,
            producer_name: "unit".to_string(),
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: 17,
            }],
            graph: Some(GraphProto {
                name: "g".to_string(),
                input: vec![ValueInfoProto {
                    name: "x".to_string(),
                    r#type: Some(TypeProto {
                        denotation: String::new(),
                        value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                            elem_type: 1,
                            shape: Some(TensorShapeProto {
                                dim: vec![
                                    tensor_shape_proto::Dimension {
                                        denotation: String::new(),
                                        value: Some(Dim::DimParam("N".to_string())),
                                    },
                                    tensor_shape_proto::Dimension {
                                        denotation: String::new(),
                                        value: Some(Dim::DimValue(3)),
                                    },
                                ],
                            }),
                        })),
                    }),
                    doc_string: String::new(),
                }],
                ..Default::default()
            }),
            ..Default::default()
        };

        let bytes = model.encode_to_vec();
        let decoded = ModelProto::decode(bytes.as_slice()).expect("decode model");
        assert_eq!(decoded, model);
    }

    #[test]
    fn rejects_truncated_bytes() {
        // Field 7 (graph), length-delimited, claims 16 bytes but carries 2.
        let bytes = [0x3a, 0x10, 0x0a, 0x00];
        assert!(ModelProto::decode(&bytes[..]).is_err());
    }
}
