//! The Admissibility Checker: structural validation followed by dimensional
//! type inference, over a fixed-order sequence of checks.
//!
//! Every check below runs and collects into `errors`/`warnings` rather than
//! failing fast: a caller sees every problem with a hypothesis in one pass,
//! not one-at-a-time across repeated submissions.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use crate::error::{ErrorCode, StructuredError};
use crate::graph::topo_peel;
use crate::hir::{Hir, NodeKind, Operator};
use crate::pds::Pds;

/// The full report produced by [`check`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissibilityReport {
    pub ok: bool,
    pub errors: Vec<StructuredError>,
    pub warnings: Vec<StructuredError>,
}

impl AdmissibilityReport {
    /// Fail if this report is not `ok`, wrapping every collected error under
    /// a single aggregate [`ErrorCode::Admissibility`] diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`StructuredError`] with `code: E_ADMISSIBILITY` when
    /// `self.ok` is `false`.
    pub fn require_ok(&self) -> Result<(), StructuredError> {
        if self.ok {
            return Ok(());
        }
        let errors: Vec<Value> = self.errors.iter().map(error_to_json).collect();
        Err(StructuredError::with_value(
            ErrorCode::Admissibility,
            "HIR failed admissibility check",
            json!({ "errors": errors }),
        ))
    }
}

fn error_to_json(err: &StructuredError) -> Value {
    json!({
        "code": err.code.as_str(),
        "message": err.message,
        "details": Value::Object(err.details.clone()),
    })
}

/// Run the full admissibility check: structural validation, then (unless
/// `phys_lint` is `false`) dimensional type inference.
///
/// Checks run in a fixed order and every check's findings are collected,
/// even after an earlier check has already failed -- a caller should never
/// need more than one round trip to see every structural and dimensional
/// problem with a hypothesis.
#[must_use]
pub fn check(hir: &Hir, phys_lint: bool) -> AdmissibilityReport {
    let mut errors = Vec::new();
    let warnings = Vec::new();

    let node_id_list: Vec<&str> = hir.nodes.iter().map(|n| n.id.as_str()).collect();
    let node_ids: BTreeSet<&str> = node_id_list.iter().copied().collect();

    // 1. Duplicate node ids.
    if node_id_list.len() != node_ids.len() {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for id in &node_id_list {
            *counts.entry(id).or_insert(0) += 1;
        }
        let mut dupes: Vec<&str> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();
        dupes.sort_unstable();
        errors.push(StructuredError::with_value(
            ErrorCode::DupNodeId,
            "duplicate node ids in HIR",
            json!({ "duplicate_ids": dupes }),
        ));
    }

    // 2. Output node must exist.
    if !node_ids.contains(hir.output_node.as_str()) {
        errors.push(StructuredError::with_value(
            ErrorCode::OutputMissing,
            "declared output node is not present in the graph",
            json!({ "output_node": hir.output_node }),
        ));
    }

    // 3. Operator whitelist and argument existence.
    for node in &hir.nodes {
        if node.kind != NodeKind::Op {
            continue;
        }
        let op_text = node.op.as_deref().unwrap_or("");
        if Operator::parse(op_text).is_none() {
            errors.push(StructuredError::with_value(
                ErrorCode::OpForbidden,
                "operator is not in the allowed set",
                json!({ "node_id": node.id, "op": node.op }),
            ));
        }
        for arg in node.args_or_empty() {
            if !node_ids.contains(arg.as_str()) {
                errors.push(StructuredError::with_value(
                    ErrorCode::ArgMissing,
                    "operator argument refers to a node that does not exist",
                    json!({ "node_id": node.id, "arg": arg }),
                ));
            }
        }
    }

    // 4. Acyclicity.
    let topo = topo_peel(hir);
    if !topo.is_acyclic() {
        errors.push(StructuredError::with_value(
            ErrorCode::Cycle,
            "HIR graph contains a cycle",
            json!({ "visited": topo.visited, "total": topo.total }),
        ));
    }

    if phys_lint {
        run_physics_lint(hir, &node_ids, &topo.order, &mut errors);
    }

    let ok = errors.is_empty();
    AdmissibilityReport {
        ok,
        errors,
        warnings,
    }
}

fn run_physics_lint(
    hir: &Hir,
    node_ids: &BTreeSet<&str>,
    topo_order: &[String],
    errors: &mut Vec<StructuredError>,
) {
    let mut inferred: BTreeMap<&str, Pds> = BTreeMap::new();

    // Seed input nodes from the declared input table.
    for node in &hir.nodes {
        if node.kind != NodeKind::Input {
            continue;
        }
        let name = node.name.as_deref();
        match name.and_then(|n| hir.inputs.get(n)) {
            Some(spec) => {
                let pds = Pds::parse(&spec.pds).unwrap_or_else(|_| Pds::dimensionless());
                inferred.insert(node.id.as_str(), pds);
            }
            None => {
                errors.push(StructuredError::with_value(
                    ErrorCode::InputMissing,
                    "input node refers to an undeclared input",
                    json!({ "node_id": node.id, "name": name }),
                ));
            }
        }
    }

    let by_id: BTreeMap<&str, _> = hir.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    // If the graph was cyclic, `topo_order` omits whatever nodes never
    // reached zero in-degree; infer over what we do have rather than abort.
    for &id in topo_order {
        let Some(node) = by_id.get(id) else { continue };

        match node.kind {
            NodeKind::Input => {}
            NodeKind::Const => {
                inferred.insert(node.id.as_str(), Pds::dimensionless());
            }
            NodeKind::Op => {
                infer_op_node(node, node_ids, &mut inferred, errors);
            }
        }
    }

    // Final check: declared output PDS must match the inferred output PDS.
    let declared = Pds::parse(&hir.declared_output_pds).unwrap_or_else(|_| Pds::dimensionless());
    if let Some(output_pds) = inferred.get(hir.output_node.as_str()) {
        if !output_pds.same_as(&declared) {
            errors.push(StructuredError::with_value(
                ErrorCode::DimInvalid,
                "inferred output PDS does not match the declared output PDS",
                json!({
                    "node_id": hir.output_node,
                    "expected_pds": declared.canonical_string(),
                    "got_pds": output_pds.canonical_string(),
                }),
            ));
        }
    }
}

fn infer_op_node<'a>(
    node: &'a crate::hir::NodeSpec,
    node_ids: &BTreeSet<&str>,
    inferred: &mut BTreeMap<&'a str, Pds>,
    errors: &mut Vec<StructuredError>,
) {
    let args = node.args_or_empty();
    let Some(op) = node.op.as_deref().and_then(Operator::parse) else {
        // Already reported as E_OP_FORBIDDEN by the structural pass.
        return;
    };

    // Arg existence was already validated structurally; here we only need
    // the already-inferred PDS for args that do exist.
    let arg_pds = |idx: usize| -> Option<&Pds> {
        args.get(idx)
            .filter(|a| node_ids.contains(a.as_str()))
            .and_then(|a| inferred.get(a.as_str()))
    };

    match op {
        Operator::Neg | Operator::Abs => {
            if let Some(pa) = arg_pds(0) {
                let pa = pa.clone();
                inferred.insert(node.id.as_str(), pa);
            }
        }
        Operator::Add | Operator::Sub => {
            let pa = arg_pds(0).cloned();
            let pb = arg_pds(1).cloned();
            if let (Some(a), Some(b)) = (&pa, &pb) {
                if !a.same_as(b) {
                    errors.push(StructuredError::with_value(
                        ErrorCode::DimMixedSum,
                        "add/sub operands have mismatched dimensions",
                        json!({
                            "node_id": node.id,
                            "left": a.canonical_string(),
                            "right": b.canonical_string(),
                        }),
                    ));
                }
            }
            inferred.insert(node.id.as_str(), pa.or(pb).unwrap_or_else(Pds::dimensionless));
        }
        Operator::Mul => {
            if let (Some(a), Some(b)) = (arg_pds(0), arg_pds(1)) {
                let product = a.multiply(b);
                inferred.insert(node.id.as_str(), product);
            }
        }
        Operator::SafeDiv => {
            if let (Some(a), Some(b)) = (arg_pds(0), arg_pds(1)) {
                let quotient = a.divide(b);
                inferred.insert(node.id.as_str(), quotient);
            }
        }
        Operator::Clip => {
            let px = arg_pds(0).cloned();
            let plo = arg_pds(1).cloned();
            let phi = arg_pds(2).cloned();
            if let (Some(x), Some(lo)) = (&px, &plo) {
                if !x.same_as(lo) {
                    errors.push(StructuredError::with_value(
                        ErrorCode::DimInvalid,
                        "clip lower bound has mismatched dimensions",
                        json!({
                            "node_id": node.id,
                            "expected": x.canonical_string(),
                            "got": lo.canonical_string(),
                        }),
                    ));
                }
            }
            if let (Some(x), Some(hi)) = (&px, &phi) {
                if !x.same_as(hi) {
                    errors.push(StructuredError::with_value(
                        ErrorCode::DimInvalid,
                        "clip upper bound has mismatched dimensions",
                        json!({
                            "node_id": node.id,
                            "expected": x.canonical_string(),
                            "got": hi.canonical_string(),
                        }),
                    ));
                }
            }
            inferred.insert(node.id.as_str(), px.unwrap_or_else(Pds::dimensionless));
        }
        Operator::Log | Operator::Exp => {
            if let Some(pa) = arg_pds(0) {
                if !pa.is_dimensionless() {
                    errors.push(StructuredError::with_value(
                        ErrorCode::NonDimlessArg,
                        "log/exp argument must be dimensionless",
                        json!({
                            "node_id": node.id,
                            "op": op.as_str(),
                            "arg_pds": pa.canonical_string(),
                        }),
                    ));
                }
            }
            inferred.insert(node.id.as_str(), Pds::dimensionless());
        }
    }
}
