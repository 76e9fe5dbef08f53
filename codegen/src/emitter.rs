//! Lowers an admissible HIR graph into a pure WebAssembly text (WAT) module.
//!
//! The emitted module takes no imports: one `i32` pointer parameter per
//! declared input, an output pointer, and an element count `n`, and writes
//! `eval_series` results directly into linear memory. Every node gets one
//! `f64` local, assigned in topological order inside a single `0..n` loop.

use hir_kernel::error::{ErrorCode, StructuredError};
use hir_kernel::graph::topo_peel;
use hir_kernel::hir::{Hir, NodeKind, Operator};
use serde_json::json;

/// Operators the pure WASM profile can lower. `log`/`exp` are admissible in
/// the HIR (they have well-defined dimensional semantics) but have no pure
/// WASM instruction equivalent without an imported intrinsic, so emission
/// fails fast on them rather than approximating.
const SUPPORTED_OPS: [Operator; 7] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::SafeDiv,
    Operator::Neg,
    Operator::Abs,
    Operator::Clip,
];

/// A lowered WASM text module, ready to be assembled/compiled by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatModule {
    /// The full `(module ...)` text.
    pub text: String,
    /// Names this module exports (`"memory"`, `"eval_series"`).
    pub exports: Vec<String>,
    /// Human-readable notes about the emitted module's guarantees and
    /// limitations.
    pub notes: Vec<String>,
}

/// Lower `hir` to a pure WAT module.
///
/// `input_order` fixes the parameter order of `eval_series`: the emitted
/// function takes one `i32` pointer parameter per name in `input_order`, in
/// that order, followed by `$out` and `$n`.
///
/// # Errors
///
/// Returns [`StructuredError`] with:
/// - `E_INPUT_ORDER_MISMATCH` if an `input` node's declared name is not
///   present in `input_order`
/// - `E_UNSUPPORTED_OP` if an `op` node uses `log` or `exp`, which have no
///   pure-WASM lowering in this profile
///
/// Callers are expected to have already run the hypothesis through
/// [`hir_kernel::checker::check`] and required it `ok`; this function does
/// not re-validate structural or dimensional admissibility.
pub fn emit(hir: &Hir, input_order: &[String]) -> Result<WatModule, StructuredError> {
    let topo = topo_peel(hir);
    let by_id: std::collections::BTreeMap<&str, &hir_kernel::hir::NodeSpec> =
        hir.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let local_lines: Vec<String> = topo
        .order
        .iter()
        .map(|id| format!("(local ${id} f64)"))
        .collect();

    let ptr_params: Vec<String> = input_order
        .iter()
        .map(|name| format!("(param $ptr_{name} i32)"))
        .collect();

    let mut body: Vec<String> = Vec::new();
    body.push("(local $i i32)".to_string());
    body.push("i32.const 0".to_string());
    body.push("local.set $i".to_string());
    body.push("(block $exit".to_string());
    body.push("  (loop $loop".to_string());
    body.push("    local.get $i".to_string());
    body.push("    local.get $n".to_string());
    body.push("    i32.ge_u".to_string());
    body.push("    br_if $exit".to_string());

    for id in &topo.order {
        let node = by_id
            .get(id.as_str())
            .expect("topo order only contains ids present in by_id");
        emit_node(node, input_order, &mut body)?;
    }

    body.push("    local.get $out".to_string());
    body.push("    local.get $i".to_string());
    body.push("    i32.const 8".to_string());
    body.push("    i32.mul".to_string());
    body.push("    i32.add".to_string());
    body.push(format!("    local.get ${}", hir.output_node));
    body.push("    f64.store".to_string());
    body.push("    local.get $i".to_string());
    body.push("    i32.const 1".to_string());
    body.push("    i32.add".to_string());
    body.push("    local.set $i".to_string());
    body.push("    br $loop".to_string());
    body.push("  )".to_string());
    body.push(")".to_string());

    let text = format!(
        "(module\n  (memory (export \"memory\") 2)\n  (func (export \"eval_series\") {} (param $out i32) (param $n i32)\n    {}\n    {}\n  )\n)",
        ptr_params.join(" "),
        local_lines.join("\n    "),
        body.join("\n    "),
    );

    let notes = vec![
        "Pure WASM module; no imports; deterministic given a deterministic engine profile."
            .to_string(),
        "log/exp are not supported by this pure-profile emitter.".to_string(),
    ];

    Ok(WatModule {
        text,
        exports: vec!["memory".to_string(), "eval_series".to_string()],
        notes,
    })
}

fn push_local(id: &str, body: &mut Vec<String>) {
    body.push(format!("    local.get ${id}"));
}

fn emit_node(
    node: &hir_kernel::hir::NodeSpec,
    input_order: &[String],
    body: &mut Vec<String>,
) -> Result<(), StructuredError> {
    match node.kind {
        NodeKind::Input => {
            let name = node.name.as_deref().unwrap_or("");
            if !input_order.iter().any(|n| n == name) {
                return Err(StructuredError::with_value(
                    ErrorCode::InputOrderMismatch,
                    "input node's name is not present in the emitter's input order",
                    json!({ "node_id": node.id, "name": name }),
                ));
            }
            body.push(format!("    local.get $ptr_{name}"));
            body.push("    local.get $i".to_string());
            body.push("    i32.const 8".to_string());
            body.push("    i32.mul".to_string());
            body.push("    i32.add".to_string());
            body.push("    f64.load".to_string());
            body.push(format!("    local.set ${}", node.id));
        }
        NodeKind::Const => {
            let value = node.value.unwrap_or(0.0);
            body.push(format!("    f64.const {value}"));
            body.push(format!("    local.set ${}", node.id));
        }
        NodeKind::Op => {
            let op_text = node.op.as_deref().unwrap_or("");
            let op = Operator::parse(op_text).ok_or_else(|| {
                StructuredError::with_value(
                    ErrorCode::UnsupportedOp,
                    "operator is not recognized by the emitter",
                    json!({ "node_id": node.id, "op": op_text }),
                )
            })?;
            if !SUPPORTED_OPS.contains(&op) {
                return Err(StructuredError::with_value(
                    ErrorCode::UnsupportedOp,
                    "operator has no pure-WASM lowering in this profile",
                    json!({ "node_id": node.id, "op": op.as_str() }),
                ));
            }
            let args = node.args_or_empty();
            emit_op(&node.id, op, args, body);
        }
    }
    Ok(())
}

fn emit_op(id: &str, op: Operator, args: &[String], body: &mut Vec<String>) {
    match op {
        Operator::Add | Operator::Sub | Operator::Mul => {
            let instr = match op {
                Operator::Add => "f64.add",
                Operator::Sub => "f64.sub",
                Operator::Mul => "f64.mul",
                _ => unreachable!(),
            };
            push_local(&args[0], body);
            push_local(&args[1], body);
            body.push(format!("    {instr}"));
            body.push(format!("    local.set ${id}"));
        }
        Operator::SafeDiv => {
            push_local(&args[1], body);
            body.push("    f64.abs".to_string());
            body.push("    f64.const 1e-12".to_string());
            body.push("    f64.lt".to_string());
            body.push("    if (result f64)".to_string());
            body.push("      f64.const 0".to_string());
            body.push("    else".to_string());
            push_local(&args[0], body);
            push_local(&args[1], body);
            body.push("      f64.div".to_string());
            body.push("    end".to_string());
            body.push(format!("    local.set ${id}"));
        }
        Operator::Neg => {
            body.push("    f64.const -1".to_string());
            push_local(&args[0], body);
            body.push("    f64.mul".to_string());
            body.push(format!("    local.set ${id}"));
        }
        Operator::Abs => {
            push_local(&args[0], body);
            body.push("    f64.abs".to_string());
            body.push(format!("    local.set ${id}"));
        }
        Operator::Clip => {
            push_local(&args[0], body);
            push_local(&args[1], body);
            body.push("    f64.max".to_string());
            push_local(&args[2], body);
            body.push("    f64.min".to_string());
            body.push(format!("    local.set ${id}"));
        }
        Operator::Log | Operator::Exp => unreachable!("filtered by SUPPORTED_OPS"),
    }
}
