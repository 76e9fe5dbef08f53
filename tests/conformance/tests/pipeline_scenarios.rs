//! End-to-end conformance scenarios spanning admissibility, emission, and
//! canary execution.

use std::collections::BTreeMap;

use hir_harness::{run_canary, RunnerConfig};
use hir_kernel::checker::check;
use hir_kernel::error::ErrorCode;
use hir_kernel::hir::{template_simple_return, Dtype, Hir, InputSpec, NodeKind, NodeSpec};

fn simple_return_input_order() -> Vec<String> {
    vec!["open".to_string(), "close".to_string()]
}

#[test]
fn simple_return_is_admissible_emittable_and_runnable() {
    let hir = template_simple_return("simple_return");
    let report = check(&hir, true);
    assert!(report.ok, "errors: {:?}", report.errors);

    let wat = hir_codegen::emit(&hir, &simple_return_input_order()).unwrap();
    assert!(wat.text.contains("eval_series"));

    let mut inputs = BTreeMap::new();
    inputs.insert("open".to_string(), vec![100.0, 50.0]);
    inputs.insert("close".to_string(), vec![110.0, 45.0]);
    let (out, receipt) = run_canary(
        &hir,
        &wat,
        &inputs,
        &simple_return_input_order(),
        &RunnerConfig::default(),
    )
    .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(receipt.n, 2);
    assert_eq!(receipt.hid_behav.len(), 64);
}

#[test]
fn safe_div_guard_zeroes_out_near_zero_denominators() {
    let hir = template_simple_return("simple_return");
    let wat = hir_codegen::emit(&hir, &simple_return_input_order()).unwrap();

    let mut inputs = BTreeMap::new();
    inputs.insert("open".to_string(), vec![0.0]);
    inputs.insert("close".to_string(), vec![5.0]);
    let config = RunnerConfig {
        max_canary_len: None,
        use_wasmtime: Some(false),
    };
    let (out, _) = run_canary(
        &hir,
        &wat,
        &inputs,
        &simple_return_input_order(),
        &config,
    )
    .unwrap();
    assert_eq!(out[0], 0.0);
}

#[test]
fn dimensional_mismatch_is_rejected_before_emission() {
    let mut hir = template_simple_return("simple_return");
    hir.declared_output_pds = "USD".to_string();
    let report = check(&hir, true);
    assert!(!report.ok);
    assert!(report
        .errors
        .iter()
        .any(|e| e.code == ErrorCode::DimInvalid));
}

#[test]
fn cyclic_graph_is_rejected_before_emission() {
    let mut inputs = BTreeMap::new();
    inputs.insert(
        "x".to_string(),
        InputSpec {
            dtype: Dtype::F64,
            pds: "1".to_string(),
        },
    );
    let hir = Hir {
        version: "0.1.0".to_string(),
        inputs,
        nodes: vec![
            NodeSpec {
                id: "a".to_string(),
                kind: NodeKind::Op,
                name: None,
                value: None,
                op: Some("neg".to_string()),
                args: Some(vec!["b".to_string()]),
            },
            NodeSpec {
                id: "b".to_string(),
                kind: NodeKind::Op,
                name: None,
                value: None,
                op: Some("neg".to_string()),
                args: Some(vec!["a".to_string()]),
            },
        ],
        output_node: "a".to_string(),
        declared_output_pds: "1".to_string(),
        metadata: serde_json::Map::new(),
    };
    let report = check(&hir, true);
    assert!(!report.ok);
    assert!(report.errors.iter().any(|e| e.code == ErrorCode::Cycle));
}

#[test]
fn log_op_is_admissible_but_unsupported_at_emission() {
    let mut inputs = BTreeMap::new();
    inputs.insert(
        "r".to_string(),
        InputSpec {
            dtype: Dtype::F64,
            pds: "1".to_string(),
        },
    );
    let hir = Hir {
        version: "0.1.0".to_string(),
        inputs,
        nodes: vec![
            NodeSpec {
                id: "n_r".to_string(),
                kind: NodeKind::Input,
                name: Some("r".to_string()),
                value: None,
                op: None,
                args: None,
            },
            NodeSpec {
                id: "n_log".to_string(),
                kind: NodeKind::Op,
                name: None,
                value: None,
                op: Some("log".to_string()),
                args: Some(vec!["n_r".to_string()]),
            },
        ],
        output_node: "n_log".to_string(),
        declared_output_pds: "1".to_string(),
        metadata: serde_json::Map::new(),
    };

    // Admissible: log of a dimensionless argument is well-typed.
    let report = check(&hir, true);
    assert!(report.ok, "errors: {:?}", report.errors);

    // But the pure WASM profile can't lower it.
    let err = hir_codegen::emit(&hir, &["r".to_string()]).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedOp);
}

#[test]
fn hid_struct_is_stable_across_equivalent_json_key_orderings() {
    let hir = template_simple_return("simple_return");
    let canonical = hir.hid_struct().unwrap();

    // Re-serialize inputs with a different insertion order via raw JSON text
    // manipulation, then re-parse: a BTreeMap-backed Hir collapses ordering
    // differences on the way in, so the digest must not move.
    let json = serde_json::to_value(&hir).unwrap();
    let reordered_text = format!(
        r#"{{"output_node":{out},"declared_output_pds":{pds},"nodes":{nodes},"inputs":{inputs},"version":{version},"metadata":{metadata}}}"#,
        out = json["output_node"],
        pds = json["declared_output_pds"],
        nodes = json["nodes"],
        inputs = json["inputs"],
        version = json["version"],
        metadata = json["metadata"],
    );
    let reparsed = Hir::from_json(&reordered_text).unwrap();
    assert_eq!(reparsed.hid_struct().unwrap(), canonical);
}
