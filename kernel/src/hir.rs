//! The HIR data model: a hypothesis is a small typed graph of input, const,
//! and op nodes with one declared output node and one declared output PDS.
//!
//! The wire shape (`serde`) mirrors the JSON a caller sends or receives
//! byte-for-byte; [`Hir::canon_value`] projects that same data into the
//! [`crate::canon::CanonValue`] tree whose hash becomes `hid_struct`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canon::{self, CanonError, CanonValue};

/// The operators an `op` node may invoke. This is the complete whitelist;
/// an unrecognized string is rejected by the checker, never silently passed
/// through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    SafeDiv,
    Neg,
    Abs,
    Clip,
    Log,
    Exp,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::SafeDiv => "safe_div",
            Self::Neg => "neg",
            Self::Abs => "abs",
            Self::Clip => "clip",
            Self::Log => "log",
            Self::Exp => "exp",
        }
    }

    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "mul" => Some(Self::Mul),
            "safe_div" => Some(Self::SafeDiv),
            "neg" => Some(Self::Neg),
            "abs" => Some(Self::Abs),
            "clip" => Some(Self::Clip),
            "log" => Some(Self::Log),
            "exp" => Some(Self::Exp),
            _ => None,
        }
    }

    /// Number of `args` the operator requires.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Neg | Self::Abs | Self::Log | Self::Exp => 1,
            Self::Add | Self::Sub | Self::Mul | Self::SafeDiv => 2,
            Self::Clip => 3,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full whitelist, in a stable order, for error messages and docs.
pub const ALLOWED_OPS: [Operator; 9] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::SafeDiv,
    Operator::Neg,
    Operator::Abs,
    Operator::Clip,
    Operator::Log,
    Operator::Exp,
];

/// The element dtype of a declared input series. Currently always `f64`;
/// kept as an enum (rather than a bare string) so a future dtype is a
/// matching-exhaustiveness compile error, not a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dtype {
    #[serde(rename = "f64")]
    F64,
}

impl Default for Dtype {
    fn default() -> Self {
        Self::F64
    }
}

/// Declaration of one named input series: its element type and its PDS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub dtype: Dtype,
    pub pds: String,
}

/// The kind of a node: an input reference, a literal constant, or an
/// operator application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Input,
    Const,
    Op,
}

/// A single node in the HIR graph.
///
/// The field set is a union over all three [`NodeKind`]s rather than a
/// `serde`-tagged enum, matching the wire format a caller actually sends:
/// `name` is populated for `input` nodes, `value` for `const` nodes, and
/// `op`/`args` for `op` nodes; the others are `None` and omitted on
/// serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

impl NodeSpec {
    /// `args`, defaulting to empty when absent -- mirrors the wire format's
    /// `n.get("args", []) or []` treatment of a missing or `null` list.
    #[must_use]
    pub fn args_or_empty(&self) -> &[String] {
        self.args.as_deref().unwrap_or(&[])
    }
}

/// A complete hypothesis: declared inputs, a node graph, and a declared
/// output node/PDS. `metadata` is caller-supplied and carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hir {
    #[serde(default = "default_version")]
    pub version: String,
    pub inputs: BTreeMap<String, InputSpec>,
    pub nodes: Vec<NodeSpec>,
    pub output_node: String,
    pub declared_output_pds: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl Hir {
    /// Parse a hypothesis from its JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if `text` is not valid JSON or does not
    /// match the expected shape.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Project this hypothesis into the canonical hashing domain.
    ///
    /// Mirrors the wire format field-for-field (inputs sorted by name,
    /// `None` fields omitted, `metadata` carried through converted to
    /// [`CanonValue`]), so that two byte-distinct-but-logically-identical
    /// JSON documents hash identically.
    #[must_use]
    pub fn canon_value(&self) -> CanonValue {
        let inputs = self.inputs.iter().map(|(name, spec)| {
            (
                name.clone(),
                CanonValue::object([
                    ("dtype".to_string(), CanonValue::from("f64")),
                    ("pds".to_string(), CanonValue::from(spec.pds.as_str())),
                ]),
            )
        });

        let nodes = self.nodes.iter().map(node_to_canon);

        CanonValue::object([
            ("version".to_string(), CanonValue::from(self.version.as_str())),
            ("inputs".to_string(), CanonValue::Object(inputs.collect())),
            ("nodes".to_string(), CanonValue::array(nodes)),
            (
                "output_node".to_string(),
                CanonValue::from(self.output_node.as_str()),
            ),
            (
                "declared_output_pds".to_string(),
                CanonValue::from(self.declared_output_pds.as_str()),
            ),
            ("metadata".to_string(), json_value_to_canon(&Value::Object(self.metadata.clone()))),
        ])
    }

    /// Compute `hid_struct`: the content-addressed digest of this
    /// hypothesis's canonical form.
    ///
    /// # Errors
    ///
    /// Propagates [`CanonError`] from canonical-bytes serialization.
    pub fn hid_struct(&self) -> Result<String, CanonError> {
        canon::hid_struct(&self.canon_value())
    }
}

fn node_to_canon(node: &NodeSpec) -> CanonValue {
    let mut fields = vec![
        ("id".to_string(), CanonValue::from(node.id.as_str())),
        (
            "kind".to_string(),
            CanonValue::from(match node.kind {
                NodeKind::Input => "input",
                NodeKind::Const => "const",
                NodeKind::Op => "op",
            }),
        ),
    ];
    if let Some(name) = &node.name {
        fields.push(("name".to_string(), CanonValue::from(name.as_str())));
    }
    if let Some(value) = node.value {
        fields.push(("value".to_string(), CanonValue::from(value)));
    }
    if let Some(op) = &node.op {
        fields.push(("op".to_string(), CanonValue::from(op.as_str())));
    }
    if let Some(args) = &node.args {
        fields.push((
            "args".to_string(),
            CanonValue::array(args.iter().map(|a| CanonValue::from(a.as_str()))),
        ));
    }
    CanonValue::object(fields)
}

/// Convert an arbitrary caller-supplied `serde_json::Value` (e.g.
/// `metadata`) into the canonical hashing domain. Numbers that parse as
/// `i64` become [`CanonValue::Int`]; all other numbers become
/// [`CanonValue::Double`].
fn json_value_to_canon(value: &Value) -> CanonValue {
    match value {
        Value::Null => CanonValue::Null,
        Value::Bool(b) => CanonValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CanonValue::Int(i)
            } else {
                CanonValue::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => CanonValue::Str(s.clone()),
        Value::Array(items) => CanonValue::array(items.iter().map(json_value_to_canon)),
        Value::Object(map) => {
            CanonValue::object(map.iter().map(|(k, v)| (k.clone(), json_value_to_canon(v))))
        }
    }
}

/// The canonical `(close - open) / open` hypothesis, used across the
/// compiler's own tests and fixtures as a minimal admissible example.
#[must_use]
pub fn template_simple_return(name: &str) -> Hir {
    let mut inputs = BTreeMap::new();
    inputs.insert(
        "open".to_string(),
        InputSpec {
            dtype: Dtype::F64,
            pds: "USD".to_string(),
        },
    );
    inputs.insert(
        "close".to_string(),
        InputSpec {
            dtype: Dtype::F64,
            pds: "USD".to_string(),
        },
    );

    let nodes = vec![
        NodeSpec {
            id: "n_open".to_string(),
            kind: NodeKind::Input,
            name: Some("open".to_string()),
            value: None,
            op: None,
            args: None,
        },
        NodeSpec {
            id: "n_close".to_string(),
            kind: NodeKind::Input,
            name: Some("close".to_string()),
            value: None,
            op: None,
            args: None,
        },
        NodeSpec {
            id: "n_num".to_string(),
            kind: NodeKind::Op,
            name: None,
            value: None,
            op: Some("sub".to_string()),
            args: Some(vec!["n_close".to_string(), "n_open".to_string()]),
        },
        NodeSpec {
            id: "n_out".to_string(),
            kind: NodeKind::Op,
            name: None,
            value: None,
            op: Some("safe_div".to_string()),
            args: Some(vec!["n_num".to_string(), "n_open".to_string()]),
        },
    ];

    let mut metadata = Map::new();
    metadata.insert("name".to_string(), Value::String(name.to_string()));

    Hir {
        version: default_version(),
        inputs,
        nodes,
        output_node: "n_out".to_string(),
        declared_output_pds: "1".to_string(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_round_trips_through_as_str_and_parse() {
        for op in ALLOWED_OPS {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
    }

    #[test]
    fn operator_arities_match_the_algebra() {
        assert_eq!(Operator::Add.arity(), 2);
        assert_eq!(Operator::Neg.arity(), 1);
        assert_eq!(Operator::Clip.arity(), 3);
    }

    #[test]
    fn unrecognized_op_text_does_not_parse() {
        assert_eq!(Operator::parse("pow"), None);
    }

    #[test]
    fn simple_return_round_trips_through_json() {
        let hir = template_simple_return("simple_return");
        let json = serde_json::to_string(&hir).unwrap();
        let parsed = Hir::from_json(&json).unwrap();
        assert_eq!(parsed, hir);
    }

    #[test]
    fn simple_return_hashes_deterministically() {
        let hir = template_simple_return("simple_return");
        let first = hir.hid_struct().unwrap();
        for _ in 0..5 {
            assert_eq!(hir.hid_struct().unwrap(), first);
        }
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn metadata_name_does_not_change_structural_shape_elsewhere() {
        let a = template_simple_return("a");
        let b = template_simple_return("b");
        // Metadata is part of the canonical form, so different metadata
        // produces a different hid_struct.
        assert_ne!(a.hid_struct().unwrap(), b.hid_struct().unwrap());
    }

    #[test]
    fn node_without_optional_fields_omits_them_from_canon() {
        let node = NodeSpec {
            id: "n0".to_string(),
            kind: NodeKind::Const,
            name: None,
            value: Some(1.0),
            op: None,
            args: None,
        };
        let canon = node_to_canon(&node);
        if let CanonValue::Object(map) = canon {
            assert!(!map.contains_key("name"));
            assert!(!map.contains_key("op"));
            assert!(!map.contains_key("args"));
            assert!(map.contains_key("value"));
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn args_or_empty_defaults_missing_args_to_empty_slice() {
        let node = NodeSpec {
            id: "n0".to_string(),
            kind: NodeKind::Input,
            name: Some("open".to_string()),
            value: None,
            op: None,
            args: None,
        };
        assert!(node.args_or_empty().is_empty());
    }
}
