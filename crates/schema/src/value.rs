//! In-memory bound data: the object graph an external deserializer produces.
//!
//! The node item graph never parses documents itself; an XML/JSON/YAML
//! binding layer hands it one of these trees. Keys are the *effective* local
//! names of the instances that produced each value.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

/// A scalar bound to a flag or field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Dec(Decimal),
}

impl ScalarValue {
    /// The lexical rendering, as it would appear in a serialized document.
    pub fn lexical(&self) -> String {
        match self {
            ScalarValue::Text(s) => s.clone(),
            ScalarValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            ScalarValue::Int(i) => i.to_string(),
            ScalarValue::Dec(d) => d.to_string(),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Int(i)
    }
}

/// A bound assembly value: flags plus named groups of model children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundAssembly {
    pub flags: BTreeMap<String, ScalarValue>,
    pub model: BTreeMap<String, Vec<BoundValue>>,
}

impl BoundAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.flags.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, value: BoundValue) -> Self {
        self.model.entry(name.into()).or_default().push(value);
        self
    }

    pub fn with_children(mut self, name: impl Into<String>, values: Vec<BoundValue>) -> Self {
        self.model.entry(name.into()).or_default().extend(values);
        self
    }
}

/// A bound field value: flags plus the field's scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundField {
    pub flags: BTreeMap<String, ScalarValue>,
    pub value: ScalarValue,
}

impl BoundField {
    pub fn new(value: impl Into<ScalarValue>) -> Self {
        Self {
            flags: BTreeMap::new(),
            value: value.into(),
        }
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.flags.insert(name.into(), value.into());
        self
    }
}

/// A value in the deserialized object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Assembly(BoundAssembly),
    Field(BoundField),
}

impl BoundValue {
    pub fn as_assembly(&self) -> Option<&BoundAssembly> {
        match self {
            BoundValue::Assembly(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&BoundField> {
        match self {
            BoundValue::Field(f) => Some(f),
            _ => None,
        }
    }

    /// The flag scalar bound under `name`, if any.
    pub fn flag(&self, name: &str) -> Option<&ScalarValue> {
        match self {
            BoundValue::Assembly(a) => a.flags.get(name),
            BoundValue::Field(f) => f.flags.get(name),
        }
    }

    /// The model children bound under `name`. Empty for fields.
    pub fn children(&self, name: &str) -> &[BoundValue] {
        match self {
            BoundValue::Assembly(a) => a.model.get(name).map(Vec::as_slice).unwrap_or(&[]),
            BoundValue::Field(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_assembly_children() {
        let value = BoundValue::Assembly(
            BoundAssembly::new()
                .with_flag("id", "c1")
                .with_child("part", BoundValue::Field(BoundField::new("cpu")))
                .with_child("part", BoundValue::Field(BoundField::new("ram"))),
        );

        assert_eq!(value.children("part").len(), 2);
        assert!(value.children("missing").is_empty());
        assert_eq!(value.flag("id"), Some(&ScalarValue::Text("c1".to_string())));
    }

    #[test]
    fn test_scalar_lexical() {
        assert_eq!(ScalarValue::Bool(true).lexical(), "true");
        assert_eq!(ScalarValue::Int(42).lexical(), "42");
        assert_eq!(ScalarValue::Text("x".to_string()).lexical(), "x");
    }
}
