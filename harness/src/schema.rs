//! Structural checker: required fields, ranges, container lengths and
//! cross-references.
//!
//! Rules address fields by JSON pointer (`/grid`, `/agent/0`). The checker
//! knows nothing about what a field means, only its declared shape.

use serde_json::Value;

use levelcert_kernel::carrier::world::WorldState;

use crate::report::{Issue, IssueKind, ValidationReport};

/// Expected length of an array.
#[derive(Debug, Clone, PartialEq)]
pub enum Length {
    Exact(usize),
    /// Equal to the integer stored at this pointer.
    Field(String),
    /// Equal to the length of the array at this pointer.
    SameAs(String),
}

/// Declared shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Integer { min: i64, max: i64 },
    Number { min: f64, max: f64 },
    Bool,
    Text,
    Object,
    Array {
        length: Option<Length>,
        items: Option<Box<FieldKind>>,
    },
}

impl FieldKind {
    #[must_use]
    pub fn integer(min: i64, max: i64) -> Self {
        Self::Integer { min, max }
    }

    #[must_use]
    pub fn number(min: f64, max: f64) -> Self {
        Self::Number { min, max }
    }

    #[must_use]
    pub fn array() -> Self {
        Self::Array {
            length: None,
            items: None,
        }
    }

    #[must_use]
    pub fn array_of(items: FieldKind, length: Option<Length>) -> Self {
        Self::Array {
            length,
            items: Some(Box::new(items)),
        }
    }
}

/// Cross-field reference that must resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossRef {
    /// `[row, col]` at `position` lies inside a `rows × cols` grid.
    Cell {
        position: String,
        rows: String,
        cols: String,
    },
    /// Every `[row, col]` in the array at `cells` lies inside the grid.
    Cells {
        cells: String,
        rows: String,
        cols: String,
    },
    /// Integer at `index` is a valid index into the array at `array`.
    Index { index: String, array: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub path: String,
    pub required: bool,
    pub kind: FieldKind,
}

/// Declarative description of a valid world document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub fields: Vec<FieldRule>,
    pub cross_refs: Vec<CrossRef>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn require(mut self, path: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            path: path.into(),
            required: true,
            kind,
        });
        self
    }

    #[must_use]
    pub fn optional(mut self, path: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            path: path.into(),
            required: false,
            kind,
        });
        self
    }

    #[must_use]
    pub fn cross_ref(mut self, rule: CrossRef) -> Self {
        self.cross_refs.push(rule);
        self
    }
}

/// Validate `world` against `schema`.
///
/// Every violation is a Critical `SchemaViolation`. Cross-references are
/// only evaluated when all field rules pass, since they read those fields.
#[must_use]
pub fn check(world: &WorldState, schema: &Schema) -> ValidationReport {
    let mut report = ValidationReport::new();
    for rule in &schema.fields {
        match world.pointer(&rule.path) {
            None if rule.required => report.push(violation(&rule.path, "required field is missing")),
            None => {}
            Some(value) => check_kind(world, &rule.path, value, &rule.kind, &mut report),
        }
    }
    if report.is_valid() {
        for cross in &schema.cross_refs {
            check_cross_ref(world, cross, &mut report);
        }
    }
    report
}

fn violation(path: &str, detail: impl std::fmt::Display) -> Issue {
    Issue::critical(IssueKind::SchemaViolation, format!("`{path}`: {detail}"))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_kind(
    world: &WorldState,
    path: &str,
    value: &Value,
    kind: &FieldKind,
    report: &mut ValidationReport,
) {
    match kind {
        FieldKind::Integer { min, max } => match value.as_i64() {
            Some(n) if (*min..=*max).contains(&n) => {}
            Some(n) => report.push(violation(path, format!("{n} outside [{min}, {max}]"))),
            None => report.push(violation(
                path,
                format!("expected integer, found {}", describe(value)),
            )),
        },
        FieldKind::Number { min, max } => match value.as_f64() {
            Some(x) if x.is_finite() && x >= *min && x <= *max => {}
            Some(x) => report.push(violation(path, format!("{x} outside [{min}, {max}]"))),
            None => report.push(violation(
                path,
                format!("expected number, found {}", describe(value)),
            )),
        },
        FieldKind::Bool if !value.is_boolean() => report.push(violation(
            path,
            format!("expected bool, found {}", describe(value)),
        )),
        FieldKind::Text if !value.is_string() => report.push(violation(
            path,
            format!("expected string, found {}", describe(value)),
        )),
        FieldKind::Object if !value.is_object() => report.push(violation(
            path,
            format!("expected object, found {}", describe(value)),
        )),
        FieldKind::Array { length, items } => {
            let Some(elems) = value.as_array() else {
                report.push(violation(
                    path,
                    format!("expected array, found {}", describe(value)),
                ));
                return;
            };
            if let Some(length) = length {
                check_length(world, path, elems.len(), length, report);
            }
            if let Some(item_kind) = items {
                for (i, elem) in elems.iter().enumerate() {
                    check_kind(world, &format!("{path}/{i}"), elem, item_kind, report);
                }
            }
        }
        FieldKind::Bool | FieldKind::Text | FieldKind::Object => {}
    }
}

fn check_length(
    world: &WorldState,
    path: &str,
    actual: usize,
    length: &Length,
    report: &mut ValidationReport,
) {
    let expected = match length {
        Length::Exact(n) => Some(*n),
        Length::Field(ptr) => world
            .pointer(ptr)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok()),
        Length::SameAs(ptr) => world.pointer(ptr).and_then(Value::as_array).map(Vec::len),
    };
    match expected {
        Some(n) if n == actual => {}
        Some(n) => report.push(violation(path, format!("length {actual}, expected {n}"))),
        None => report.push(violation(path, "declared length cannot be resolved")),
    }
}

fn cell_of(value: &Value) -> Option<(i64, i64)> {
    match value.as_array()?.as_slice() {
        [r, c] => Some((r.as_i64()?, c.as_i64()?)),
        _ => None,
    }
}

fn check_cross_ref(world: &WorldState, rule: &CrossRef, report: &mut ValidationReport) {
    let dim = |ptr: &str| world.pointer(ptr).and_then(Value::as_i64);
    match rule {
        CrossRef::Cell {
            position,
            rows,
            cols,
        } => {
            let Some(value) = world.pointer(position) else {
                return;
            };
            check_cell(position, value, dim(rows), dim(cols), report);
        }
        CrossRef::Cells { cells, rows, cols } => {
            let Some(list) = world.pointer(cells).and_then(Value::as_array) else {
                return;
            };
            for (i, value) in list.iter().enumerate() {
                check_cell(&format!("{cells}/{i}"), value, dim(rows), dim(cols), report);
            }
        }
        CrossRef::Index { index, array } => {
            let Some(value) = world.pointer(index) else {
                return;
            };
            let len = world.pointer(array).and_then(Value::as_array).map(Vec::len);
            match (value.as_u64(), len) {
                (Some(i), Some(len)) if usize::try_from(i).is_ok_and(|i| i < len) => {}
                (Some(i), Some(len)) => report.push(violation(
                    index,
                    format!("index {i} out of range for `{array}` (length {len})"),
                )),
                _ => report.push(violation(index, format!("cannot resolve index into `{array}`"))),
            }
        }
    }
}

fn check_cell(
    path: &str,
    value: &Value,
    rows: Option<i64>,
    cols: Option<i64>,
    report: &mut ValidationReport,
) {
    let (Some(rows), Some(cols)) = (rows, cols) else {
        report.push(violation(path, "grid dimensions cannot be resolved"));
        return;
    };
    match cell_of(value) {
        Some((r, c)) if (0..rows).contains(&r) && (0..cols).contains(&c) => {}
        Some((r, c)) => report.push(violation(
            path,
            format!("cell [{r}, {c}] outside {rows}x{cols} grid"),
        )),
        None => report.push(violation(path, "expected [row, col] pair")),
    }
}
