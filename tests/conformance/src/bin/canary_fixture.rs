//! Tiny binary that emits and runs a canary from a combined fixture file and
//! prints the receipt as JSON.
//!
//! Fixture shape: `{"hir": <HIR>, "input_order": [...], "inputs": {"name": [f64...]}}`.
//!
//! Usage: `canary_fixture <fixture-path.json>`

use std::collections::BTreeMap;

use hir_harness::{run_canary, RunnerConfig};
use hir_kernel::hir::Hir;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let fixture_path = args.get(1).expect("usage: canary_fixture <fixture-path>");

    let contents = std::fs::read_to_string(fixture_path)
        .unwrap_or_else(|e| panic!("cannot read fixture at {fixture_path}: {e}"));
    let fixture: serde_json::Value = serde_json::from_str(&contents).expect("fixture is valid JSON");

    let hir: Hir = serde_json::from_value(fixture["hir"].clone()).expect("fixture.hir is a valid HIR document");
    let input_order: Vec<String> = fixture["input_order"]
        .as_array()
        .expect("fixture.input_order is an array")
        .iter()
        .map(|v| v.as_str().expect("input_order entries are strings").to_string())
        .collect();
    let inputs: BTreeMap<String, Vec<f64>> = fixture["inputs"]
        .as_object()
        .expect("fixture.inputs is an object")
        .iter()
        .map(|(name, values)| {
            let series = values
                .as_array()
                .expect("input series is an array")
                .iter()
                .map(|v| v.as_f64().expect("input series entries are numbers"))
                .collect();
            (name.clone(), series)
        })
        .collect();

    let wat = hir_codegen::emit(&hir, &input_order).expect("fixture HIR is emittable");
    let (_, receipt) = run_canary(&hir, &wat, &inputs, &input_order, &RunnerConfig::default())
        .expect("fixture inputs satisfy canary preconditions");

    println!("{}", serde_json::to_string_pretty(&receipt).unwrap());
}
