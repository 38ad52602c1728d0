//! Model introspection for ONNX files: load, check, and describe.
//!
//! ```no_run
//! use onnxscope_inspect::{inspect, ReportOptions};
//!
//! let report = inspect("model.onnx", &ReportOptions::truncated(10))?;
//! print!("{report}");
//! # Ok::<(), onnxscope_inspect::InspectError>(())
//! ```

pub mod checker;
pub mod dummy;
pub mod error;
pub mod loader;
pub mod model;
pub mod report;

use std::path::Path;

pub use dummy::{report_dummy_run, run_dummy_inference, run_with_backend, zero_inputs, DummyRun};
pub use error::InspectError;
pub use loader::{decode_model, load_and_validate};
pub use model::{Dim, InitializerInfo, ModelInfo, NodeInfo, OpsetImport, TensorDecl};
pub use report::{
    render_report, report_initializers, report_inputs, report_metadata, report_nodes,
    report_outputs, ReportOptions, DEFAULT_MAX_ENTRIES,
};

/// Structural report for the model at `path`. Nothing is rendered unless the
/// model loads and passes the checker.
pub fn inspect(path: impl AsRef<Path>, opts: &ReportOptions) -> Result<String, InspectError> {
    let model = load_and_validate(path)?;
    let info = ModelInfo::from_proto(&model);
    Ok(render_report(&info, opts))
}
