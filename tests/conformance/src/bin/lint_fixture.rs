//! Tiny binary that runs the admissibility checker over a HIR fixture file
//! and prints its report as JSON.
//!
//! Usage: `lint_fixture <fixture-path.json>`

use hir_kernel::checker::check;
use hir_kernel::hir::Hir;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let fixture_path = args.get(1).expect("usage: lint_fixture <fixture-path>");

    let contents = std::fs::read_to_string(fixture_path)
        .unwrap_or_else(|e| panic!("cannot read fixture at {fixture_path}: {e}"));
    let hir = Hir::from_json(&contents).expect("fixture is a valid HIR document");

    let report = check(&hir, true);
    let errors: Vec<serde_json::Value> = report
        .errors
        .iter()
        .map(|e| serde_json::json!({ "code": e.code.as_str(), "message": e.message, "details": e.details }))
        .collect();

    let output = serde_json::json!({ "ok": report.ok, "errors": errors });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
