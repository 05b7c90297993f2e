// Result Schema
// Declared top-level shape of a capability's payload

use serde_json::Value;

/// JSON kind expected for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Object,
    Array,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::String => value.is_string(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Number => write!(f, "number"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Object => write!(f, "object"),
            FieldKind::Array => write!(f, "array"),
        }
    }
}

/// Required top-level field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Field that did not satisfy the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Offending field, or `$` when the payload itself is not an object
    pub field: String,
    pub expected: String,
}

/// Set of required fields; extra fields are always allowed
#[derive(Debug, Clone, Copy)]
pub struct ResultSchema {
    fields: &'static [FieldSpec],
}

impl ResultSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// Check a payload, reporting the first violation found
    pub fn check(&self, value: &Value) -> Result<(), Violation> {
        let object = value.as_object().ok_or_else(|| Violation {
            field: "$".to_string(),
            expected: "object".to_string(),
        })?;

        for spec in self.fields {
            match object.get(spec.name) {
                Some(v) if spec.kind.matches(v) => {}
                _ => {
                    return Err(Violation {
                        field: spec.name.to_string(),
                        expected: spec.kind.to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("aqi_pm25", FieldKind::Number),
        FieldSpec::new("category", FieldKind::String),
    ];
    const SCHEMA: ResultSchema = ResultSchema::new(FIELDS);

    #[test]
    fn test_accepts_extra_fields() {
        let value = json!({"aqi_pm25": 42, "category": "Good", "extra": true});
        assert!(SCHEMA.check(&value).is_ok());
    }

    #[test]
    fn test_reports_missing_field() {
        let err = SCHEMA.check(&json!({"aqi_pm25": 42})).unwrap_err();
        assert_eq!(err.field, "category");
        assert_eq!(err.expected, "string");
    }

    #[test]
    fn test_reports_wrong_kind() {
        let err = SCHEMA
            .check(&json!({"aqi_pm25": "42", "category": "Good"}))
            .unwrap_err();
        assert_eq!(err.field, "aqi_pm25");
        assert_eq!(err.expected, "number");
    }

    #[test]
    fn test_rejects_non_object() {
        let err = SCHEMA.check(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.field, "$");
    }
}
