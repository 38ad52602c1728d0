use onnxscope_core::dtype_label;
use onnxscope_proto::{
    tensor_shape_proto::dimension::Value as DimValue, type_proto, ModelProto, NodeProto,
    TensorProto, ValueInfoProto, DEFAULT_DOMAIN,
};
use tracing::debug;

/// Flattened, owned view of the parts of a model the reports print.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelInfo {
    pub ir_version: i64,
    pub producer_name: String,
    pub producer_version: String,
    pub domain: String,
    pub model_version: i64,
    pub graph_name: String,
    pub opsets: Vec<OpsetImport>,
    pub metadata: Vec<(String, String)>,
    pub inputs: Vec<TensorDecl>,
    pub outputs: Vec<TensorDecl>,
    pub initializers: Vec<InitializerInfo>,
    pub nodes: Vec<NodeInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpsetImport {
    pub domain: String,
    pub version: i64,
}

impl OpsetImport {
    /// The domain as printed: empty means the default operator set.
    pub fn display_domain(&self) -> &str {
        if self.domain.is_empty() {
            DEFAULT_DOMAIN
        } else {
            &self.domain
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dim {
    Fixed(i64),
    Symbolic(String),
    Unset,
}

impl Dim {
    /// Reported size; symbolic and unset dimensions are not resolved.
    pub fn size(&self) -> i64 {
        match self {
            Dim::Fixed(v) => *v,
            Dim::Symbolic(_) | Dim::Unset => 0,
        }
    }
}

/// A declared graph input or output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorDecl {
    pub name: String,
    pub elem_type: i32,
    pub dims: Vec<Dim>,
}

impl TensorDecl {
    fn from_value_info(value: &ValueInfoProto) -> Self {
        let tensor = value.r#type.as_ref().and_then(|t| match &t.value {
            Some(type_proto::Value::TensorType(tensor)) => Some(tensor),
            None => None,
        });

        let dims = tensor
            .and_then(|t| t.shape.as_ref())
            .map(|shape| {
                shape
                    .dim
                    .iter()
                    .map(|d| match &d.value {
                        Some(DimValue::DimValue(v)) => Dim::Fixed(*v),
                        Some(DimValue::DimParam(p)) => {
                            debug!(tensor = %value.name, dim = %p, "symbolic dimension");
                            Dim::Symbolic(p.clone())
                        }
                        None => Dim::Unset,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: value.name.clone(),
            elem_type: tensor.map_or(0, |t| t.elem_type),
            dims,
        }
    }

    pub fn sizes(&self) -> Vec<i64> {
        self.dims.iter().map(Dim::size).collect()
    }

    pub fn dtype_label(&self) -> &'static str {
        dtype_label(self.elem_type)
    }
}

/// A stored weight tensor. The payload itself is not kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitializerInfo {
    pub name: String,
    pub data_type: i32,
    pub dims: Vec<i64>,
}

impl InitializerInfo {
    fn from_tensor(tensor: &TensorProto) -> Self {
        Self {
            name: tensor.name.clone(),
            data_type: tensor.data_type,
            dims: tensor.dims.clone(),
        }
    }

    /// Element count, or `None` if the dims multiply past `u64`. Negative
    /// dims count as zero.
    pub fn numel(&self) -> Option<u64> {
        self.dims
            .iter()
            .map(|d| u64::try_from(*d).unwrap_or(0))
            .try_fold(1u64, u64::checked_mul)
    }

    pub fn dtype_label(&self) -> &'static str {
        dtype_label(self.data_type)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    pub op_type: String,
    pub domain: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl NodeInfo {
    fn from_node(node: &NodeProto) -> Self {
        Self {
            name: node.name.clone(),
            op_type: node.op_type.clone(),
            domain: node.domain.clone(),
            inputs: node.input.clone(),
            outputs: node.output.clone(),
        }
    }
}

impl ModelInfo {
    pub fn from_proto(model: &ModelProto) -> Self {
        let mut info = Self {
            ir_version: model.ir_version,
            producer_name: model.producer_name.clone(),
            producer_version: model.producer_version.clone(),
            domain: model.domain.clone(),
            model_version: model.model_version,
            opsets: model
                .opset_import
                .iter()
                .map(|o| OpsetImport {
                    domain: o.domain.clone(),
                    version: o.version,
                })
                .collect(),
            metadata: model
                .metadata_props
                .iter()
                .map(|e| (e.key.clone(), e.value.clone()))
                .collect(),
            ..Self::default()
        };

        if let Some(graph) = model.graph.as_ref() {
            info.graph_name = graph.name.clone();
            info.inputs = graph.input.iter().map(TensorDecl::from_value_info).collect();
            info.outputs = graph.output.iter().map(TensorDecl::from_value_info).collect();
            info.initializers = graph
                .initializer
                .iter()
                .map(InitializerInfo::from_tensor)
                .collect();
            info.nodes = graph.node.iter().map(NodeInfo::from_node).collect();
        }

        info
    }

    /// Total element count across all initializers, or `None` on overflow.
    pub fn parameter_count(&self) -> Option<u64> {
        self.initializers
            .iter()
            .try_fold(0u64, |total, init| total.checked_add(init.numel()?))
    }
}
