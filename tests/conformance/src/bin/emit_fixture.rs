//! Tiny binary that lowers a HIR fixture file to WAT and prints the module
//! text, or the emission error as JSON.
//!
//! Usage: `emit_fixture <fixture-path.json> <input-name>...`

use hir_kernel::hir::Hir;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let fixture_path = args
        .get(1)
        .expect("usage: emit_fixture <fixture-path> <input-name>...");
    let input_order: Vec<String> = args[2..].to_vec();

    let contents = std::fs::read_to_string(fixture_path)
        .unwrap_or_else(|e| panic!("cannot read fixture at {fixture_path}: {e}"));
    let hir = Hir::from_json(&contents).expect("fixture is a valid HIR document");

    match hir_codegen::emit(&hir, &input_order) {
        Ok(module) => println!("{}", module.text),
        Err(err) => {
            let output = serde_json::json!({
                "code": err.code.as_str(),
                "message": err.message,
                "details": err.details,
            });
            eprintln!("{}", serde_json::to_string_pretty(&output).unwrap());
            std::process::exit(1);
        }
    }
}
