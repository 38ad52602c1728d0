use std::path::PathBuf;

use clap::{error::ErrorKind, Parser};
use onnxscope_core::Device;
use onnxscope_inspect::{ReportOptions, DEFAULT_MAX_ENTRIES};

/// Exit status for a malformed command line.
pub const USAGE_EXIT_CODE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "onnxscope",
    version,
    about = "Print the inputs, outputs, weights and nodes of an ONNX model"
)]
pub struct Cli {
    /// Path to the ONNX model file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// List only the first --max-entries initializers and nodes
    #[arg(long)]
    pub truncate: bool,

    /// Listing cap applied by --truncate
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    pub max_entries: usize,

    /// Also run one zero-filled inference through ONNX Runtime
    #[arg(long)]
    pub run: bool,

    /// Device for the dummy run (cpu or cuda:N)
    #[arg(long, default_value = "cpu", value_parser = parse_device)]
    pub device: Device,

    /// Log filter for stderr output (RUST_LOG syntax)
    #[arg(long, default_value = "warn")]
    pub log: String,
}

impl Cli {
    pub fn report_options(&self) -> ReportOptions {
        if self.truncate {
            ReportOptions::truncated(self.max_entries)
        } else {
            ReportOptions::full()
        }
    }
}

/// Help and version requests are not usage errors.
pub fn is_usage_error(err: &clap::Error) -> bool {
    !matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

pub fn parse_device(raw: &str) -> Result<Device, String> {
    if raw.eq_ignore_ascii_case("cpu") {
        return Ok(Device::Cpu);
    }

    if let Some(rest) = raw.strip_prefix("cuda:") {
        let device_id: u32 = rest
            .parse()
            .map_err(|_| format!("invalid cuda device id: {rest}"))?;
        return Ok(Device::Cuda { device_id });
    }

    Err(format!("unsupported device: {raw} (expected cpu or cuda:N)"))
}
