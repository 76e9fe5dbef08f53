//! Pure-Rust reference interpreter: the canary runner's fallback evaluation
//! path when `wasmtime` is unavailable or disabled.
//!
//! Unlike the WAT emitter, the reference interpreter is not limited to the
//! pure-WASM profile -- it evaluates every admissible operator, including
//! `log`/`exp`, directly against the HIR graph's own semantics. It exists to
//! give a canary run an answer even with no WASM engine present, not to
//! match the emitted module bit-for-bit (the two are independent
//! implementations of the same node semantics, which is the point: a
//! divergence between them is itself a signal worth surfacing).

use std::collections::BTreeMap;

use hir_kernel::graph::topo_peel;
use hir_kernel::hir::{Hir, NodeKind, Operator};

/// Evaluate `hir` over the first `n` elements of `inputs`, returning the
/// output series.
///
/// `inputs` must contain every name the HIR declares as an input; this
/// function does not itself validate that precondition (the runner does,
/// before calling either evaluation path).
#[must_use]
pub fn eval_series(hir: &Hir, inputs: &BTreeMap<String, Vec<f64>>, n: usize) -> Vec<f64> {
    let topo = topo_peel(hir);
    let by_id: BTreeMap<&str, &hir_kernel::hir::NodeSpec> =
        hir.nodes.iter().map(|node| (node.id.as_str(), node)).collect();

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let mut values: BTreeMap<&str, f64> = BTreeMap::new();
        for id in &topo.order {
            let node = by_id[id.as_str()];
            let value = match node.kind {
                NodeKind::Input => {
                    let name = node.name.as_deref().unwrap_or("");
                    inputs.get(name).map_or(f64::NAN, |series| series[i])
                }
                NodeKind::Const => node.value.unwrap_or(0.0),
                NodeKind::Op => eval_op(node, &values),
            };
            values.insert(id.as_str(), value);
        }
        out.push(values.get(hir.output_node.as_str()).copied().unwrap_or(f64::NAN));
    }
    out
}

fn eval_op(node: &hir_kernel::hir::NodeSpec, values: &BTreeMap<&str, f64>) -> f64 {
    let args = node.args_or_empty();
    let arg = |idx: usize| args.get(idx).and_then(|id| values.get(id.as_str())).copied().unwrap_or(f64::NAN);

    let Some(op) = node.op.as_deref().and_then(Operator::parse) else {
        return f64::NAN;
    };

    match op {
        Operator::Add => arg(0) + arg(1),
        Operator::Sub => arg(0) - arg(1),
        Operator::Mul => arg(0) * arg(1),
        Operator::SafeDiv => {
            let b = arg(1);
            if b.abs() < 1e-12 {
                0.0
            } else {
                arg(0) / b
            }
        }
        Operator::Neg => -arg(0),
        Operator::Abs => arg(0).abs(),
        Operator::Clip => arg(0).max(arg(1)).min(arg(2)),
        Operator::Log => arg(0).ln(),
        Operator::Exp => arg(0).exp(),
    }
}
