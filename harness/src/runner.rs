//! The Canary Runner: executes an emitted WAT module against synthetic
//! input data and produces a [`CanaryReceipt`].
//!
//! Pipeline: validate preconditions -> clamp to at most
//! [`config::DEFAULT_MAX_CANARY_LEN`] elements -> run on `wasmtime` when the
//! `wasmtime` feature is enabled and the run's config asks for it -> fall
//! back to the pure-Rust [`reference_interp`] otherwise, or if the engine
//! path itself fails -> summarize the output series into a
//! [`CanaryReceipt`].

use std::collections::BTreeMap;
use std::time::Instant;

use hir_codegen::WatModule;
use hir_kernel::error::{ErrorCode, StructuredError};
use serde_json::json;

use crate::config::RunnerConfig;
use crate::receipt::CanaryReceipt;
use crate::reference_interp;
use crate::sketch::sketch_hash;

const REFERENCE_ENGINE_ID: &str = "reference-interpreter";

/// Run a canary: validate shapes, execute, and summarize.
///
/// # Errors
///
/// Returns [`StructuredError`] if:
/// - `input_order` is empty (`E_INPUT_ORDER_MISMATCH`)
/// - `inputs` is missing a name `input_order` requires (`E_MISSING_INPUT_COLUMN`)
/// - the supplied input series have mismatched lengths (`E_INPUT_LENGTH_MISMATCH`)
pub fn run_canary(
    hir: &hir_kernel::hir::Hir,
    wat: &WatModule,
    inputs: &BTreeMap<String, Vec<f64>>,
    input_order: &[String],
    config: &RunnerConfig,
) -> Result<(Vec<f64>, CanaryReceipt), StructuredError> {
    if input_order.is_empty() {
        return Err(StructuredError::with_value(
            ErrorCode::InputOrderMismatch,
            "input_order must include at least one input name",
            json!({}),
        ));
    }

    let missing: Vec<&str> = input_order
        .iter()
        .map(String::as_str)
        .filter(|name| !inputs.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(StructuredError::with_value(
            ErrorCode::MissingInputColumn,
            "inputs missing required keys",
            json!({ "missing": missing }),
        ));
    }

    let lengths: Vec<usize> = input_order
        .iter()
        .map(|name| inputs[name].len())
        .collect();
    if lengths.iter().any(|len| *len != lengths[0]) {
        let by_name: serde_json::Map<String, serde_json::Value> = input_order
            .iter()
            .zip(&lengths)
            .map(|(name, len)| (name.clone(), json!(len)))
            .collect();
        return Err(StructuredError::with_value(
            ErrorCode::InputLengthMismatch,
            "inputs have mismatched lengths",
            serde_json::Value::Object(by_name),
        ));
    }

    let n = lengths[0].min(config.max_canary_len());
    let mut notes = Vec::new();

    let start = Instant::now();
    let (out, engine) = evaluate(hir, wat, inputs, input_order, n, config, &mut notes);
    let runtime_ms = start.elapsed().as_secs_f64() * 1000.0;

    let nan_count = out.iter().filter(|v| v.is_nan()).count();
    let inf_count = out.iter().filter(|v| v.is_infinite()).count();
    let finite: Vec<f64> = out.iter().copied().filter(|v| v.is_finite()).collect();

    let mean = if finite.is_empty() {
        0.0
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };
    let std = if finite.is_empty() {
        0.0
    } else {
        let variance =
            finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / finite.len() as f64;
        variance.sqrt()
    };

    let receipt = CanaryReceipt {
        hid_behav: sketch_hash(&out),
        n,
        mean,
        std,
        nan_rate: nan_count as f64 / n as f64,
        inf_rate: inf_count as f64 / n as f64,
        runtime_ms,
        engine,
        notes,
    };

    Ok((out, receipt))
}

#[cfg(feature = "wasmtime")]
fn evaluate(
    hir: &hir_kernel::hir::Hir,
    wat: &WatModule,
    inputs: &BTreeMap<String, Vec<f64>>,
    input_order: &[String],
    n: usize,
    config: &RunnerConfig,
    notes: &mut Vec<String>,
) -> (Vec<f64>, String) {
    if config.use_wasmtime() {
        match run_via_wasmtime(wat, inputs, input_order, n) {
            Ok((out, engine)) => return (out, engine),
            Err(reason) => {
                notes.push(format!("wasmtime run failed: {reason}; using reference interpreter"));
            }
        }
    }
    (reference_interp::eval_series(hir, inputs, n), REFERENCE_ENGINE_ID.to_string())
}

#[cfg(not(feature = "wasmtime"))]
fn evaluate(
    hir: &hir_kernel::hir::Hir,
    _wat: &WatModule,
    inputs: &BTreeMap<String, Vec<f64>>,
    _input_order: &[String],
    n: usize,
    _config: &RunnerConfig,
    notes: &mut Vec<String>,
) -> (Vec<f64>, String) {
    notes.push("wasmtime feature not compiled in; using reference interpreter".to_string());
    (reference_interp::eval_series(hir, inputs, n), REFERENCE_ENGINE_ID.to_string())
}

#[cfg(feature = "wasmtime")]
fn run_via_wasmtime(
    wat: &WatModule,
    inputs: &BTreeMap<String, Vec<f64>>,
    input_order: &[String],
    n: usize,
) -> Result<(Vec<f64>, String), String> {
    use wasmtime::{Engine, Instance, Linker, Memory, Module, Store, Val};

    let engine = Engine::default();
    let module = Module::new(&engine, &wat.text).map_err(|e| e.to_string())?;
    let linker: Linker<()> = Linker::new(&engine);
    let mut store = Store::new(&engine, ());
    let instance: Instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| e.to_string())?;
    let memory: Memory = instance
        .get_memory(&mut store, "memory")
        .ok_or("module does not export \"memory\"")?;

    // Lay inputs out contiguously, then the output buffer after them.
    let mut offset: usize = 0;
    let mut ptrs: BTreeMap<&str, i32> = BTreeMap::new();
    for name in input_order {
        let series = &inputs[name];
        let bytes: Vec<u8> = series[..n].iter().flat_map(|v| v.to_le_bytes()).collect();
        ptrs.insert(name.as_str(), i32::try_from(offset).map_err(|e| e.to_string())?);
        memory
            .write(&mut store, offset, &bytes)
            .map_err(|e| e.to_string())?;
        offset += bytes.len();
    }
    let out_ptr = offset;
    memory
        .write(&mut store, out_ptr, &vec![0u8; n * 8])
        .map_err(|e| e.to_string())?;

    let func = instance
        .get_func(&mut store, "eval_series")
        .ok_or("module does not export \"eval_series\"")?;

    let mut args: Vec<Val> = input_order
        .iter()
        .map(|name| Val::I32(ptrs[name.as_str()]))
        .collect();
    args.push(Val::I32(i32::try_from(out_ptr).map_err(|e| e.to_string())?));
    args.push(Val::I32(i32::try_from(n).map_err(|e| e.to_string())?));

    func.call(&mut store, &args, &mut []).map_err(|e| e.to_string())?;

    let mut out_bytes = vec![0u8; n * 8];
    memory
        .read(&store, out_ptr, &mut out_bytes)
        .map_err(|e| e.to_string())?;
    let out: Vec<f64> = out_bytes
        .chunks_exact(8)
        .map(|chunk| f64::from_le_bytes(chunk.try_into().expect("chunks_exact(8)")))
        .collect();

    let engine_id = format!("wasmtime-{}", wasmtime::VERSION);

    Ok((out, engine_id))
}
