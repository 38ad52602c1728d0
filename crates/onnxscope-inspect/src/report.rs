//! Text rendering of a [`ModelInfo`].
//!
//! Every section lists entries in declaration order and ends with a blank
//! line, so sections can be concatenated into the full report.

use std::fmt::{self, Write};

use onnxscope_core::write_dims;

use crate::model::{ModelInfo, TensorDecl};

pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// How long listings are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Cap for the initializer and node listings; `None` lists everything.
    pub max_entries: Option<usize>,
}

impl ReportOptions {
    pub fn full() -> Self {
        Self { max_entries: None }
    }

    pub fn truncated(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
        }
    }
}

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // fmt::Write for String never fails.
    let _ = f(&mut out);
    out
}

pub fn report_metadata(info: &ModelInfo) -> String {
    render(|out| {
        writeln!(out, "Model IR version: {}", info.ir_version)?;
        writeln!(
            out,
            "Producer: {} ({})",
            info.producer_name, info.producer_version
        )?;
        if !info.graph_name.is_empty() {
            writeln!(out, "Graph: {}", info.graph_name)?;
        }
        if !info.domain.is_empty() {
            writeln!(out, "Model domain: {}", info.domain)?;
        }
        if info.model_version != 0 {
            writeln!(out, "Model version: {}", info.model_version)?;
        }

        writeln!(out, "Opset imports:")?;
        for opset in &info.opsets {
            writeln!(
                out,
                "  domain={} opset={}",
                opset.display_domain(),
                opset.version
            )?;
        }

        if !info.metadata.is_empty() {
            writeln!(out, "Metadata:")?;
            for (key, value) in &info.metadata {
                writeln!(out, "  {key}={value}")?;
            }
        }

        let parameters = match info.parameter_count() {
            Some(n) => format!("{n} parameters"),
            None => "parameter count overflows u64".to_string(),
        };
        writeln!(
            out,
            "Totals: {} inputs, {} outputs, {} initializers, {} nodes, {parameters}",
            info.inputs.len(),
            info.outputs.len(),
            info.initializers.len(),
            info.nodes.len(),
        )?;
        writeln!(out)
    })
}

fn write_decls(out: &mut String, title: &str, decls: &[TensorDecl]) -> fmt::Result {
    writeln!(out, "=== {title} ===")?;
    for decl in decls {
        write!(out, "  {}\tshape=", decl.name)?;
        write_dims(out, decl.sizes())?;
        writeln!(out, "\tdtype={}", decl.dtype_label())?;
    }
    writeln!(out)
}

pub fn report_inputs(info: &ModelInfo) -> String {
    render(|out| write_decls(out, "Inputs", &info.inputs))
}

pub fn report_outputs(info: &ModelInfo) -> String {
    render(|out| write_decls(out, "Outputs", &info.outputs))
}

/// Writes at most `cap` entries, then a `...and <k> more <noun>...` line if
/// any were left out.
fn write_capped<T>(
    out: &mut String,
    items: &[T],
    cap: Option<usize>,
    noun: &str,
    mut entry: impl FnMut(&mut String, &T) -> fmt::Result,
) -> fmt::Result {
    let shown = cap.map_or(items.len(), |cap| cap.min(items.len()));
    for item in items.iter().take(shown) {
        entry(out, item)?;
    }
    let omitted = items.len() - shown;
    if omitted > 0 {
        writeln!(out, "  ...and {omitted} more {noun}...")?;
    }
    Ok(())
}

fn title(base: &str, opts: &ReportOptions) -> String {
    match opts.max_entries {
        Some(cap) => format!("=== {base} (first {cap}) ==="),
        None => format!("=== {base} ==="),
    }
}

pub fn report_initializers(info: &ModelInfo, opts: &ReportOptions) -> String {
    render(|out| {
        writeln!(out, "{}", title("Initializers", opts))?;
        write_capped(
            out,
            &info.initializers,
            opts.max_entries,
            "initializers",
            |out, init| {
                write!(out, "  {}\tshape=", init.name)?;
                write_dims(out, &init.dims)?;
                writeln!(out, "\tdtype={}", init.dtype_label())
            },
        )?;
        writeln!(out)
    })
}

pub fn report_nodes(info: &ModelInfo, opts: &ReportOptions) -> String {
    render(|out| {
        writeln!(out, "{}", title("Nodes", opts))?;
        write_capped(out, &info.nodes, opts.max_entries, "nodes", |out, node| {
            write!(
                out,
                "  {:15}  inputs=[{}]  outputs=[{}]",
                node.op_type,
                node.inputs.join(", "),
                node.outputs.join(", ")
            )?;
            if !node.name.is_empty() {
                write!(out, "  name={}", node.name)?;
            }
            writeln!(out)
        })?;
        writeln!(out)
    })
}

/// Metadata, inputs, outputs, initializers and nodes, in that order.
pub fn render_report(info: &ModelInfo, opts: &ReportOptions) -> String {
    let mut out = report_metadata(info);
    out.push_str(&report_inputs(info));
    out.push_str(&report_outputs(info));
    out.push_str(&report_initializers(info, opts));
    out.push_str(&report_nodes(info, opts));
    out
}
