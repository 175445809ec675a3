use crate::QueryError;
use crate::query::value::{compare_values, is_valid_path, like_matches, lookup, values_equal, write_path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Filter predicate of a [`Query`](crate::query::Query).
///
/// Build it fluently from a field path:
/// ```
/// use fluent_query_rust_lib::query::Criteria;
///
/// let criteria = Criteria::field("age").gte(18).and(Criteria::field("country").eq("FR"));
/// assert_eq!(criteria.to_string(), "(`age` >= 18 AND `country` = \"FR\")");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Criteria {
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Gt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lt { field: String, value: Value },
    Lte { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    NotIn { field: String, values: Vec<Value> },
    Like { field: String, pattern: String },
    Exists { field: String },
    IsNull { field: String },
    And { criteria: Vec<Criteria> },
    Or { criteria: Vec<Criteria> },
    Not { criteria: Box<Criteria> },
}

/// Intermediate step of `Criteria::field(..)`.
#[derive(Debug, Clone)]
pub struct FieldCriteria {
    field: String,
}

impl FieldCriteria {
    pub fn eq(self, value: impl Into<Value>) -> Criteria {
        Criteria::Eq {
            field: self.field,
            value: value.into(),
        }
    }

    pub fn ne(self, value: impl Into<Value>) -> Criteria {
        Criteria::Ne {
            field: self.field,
            value: value.into(),
        }
    }

    pub fn gt(self, value: impl Into<Value>) -> Criteria {
        Criteria::Gt {
            field: self.field,
            value: value.into(),
        }
    }

    pub fn gte(self, value: impl Into<Value>) -> Criteria {
        Criteria::Gte {
            field: self.field,
            value: value.into(),
        }
    }

    pub fn lt(self, value: impl Into<Value>) -> Criteria {
        Criteria::Lt {
            field: self.field,
            value: value.into(),
        }
    }

    pub fn lte(self, value: impl Into<Value>) -> Criteria {
        Criteria::Lte {
            field: self.field,
            value: value.into(),
        }
    }

    pub fn in_values<I, V>(self, values: I) -> Criteria
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Criteria::In {
            field: self.field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<I, V>(self, values: I) -> Criteria
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Criteria::NotIn {
            field: self.field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn like(self, pattern: impl Into<String>) -> Criteria {
        Criteria::Like {
            field: self.field,
            pattern: pattern.into(),
        }
    }

    pub fn exists(self) -> Criteria {
        Criteria::Exists { field: self.field }
    }

    pub fn is_null(self) -> Criteria {
        Criteria::IsNull { field: self.field }
    }
}

impl Criteria {
    pub fn field(path: impl Into<String>) -> FieldCriteria {
        FieldCriteria { field: path.into() }
    }

    /// Conjunction; nested `And`s are flattened.
    pub fn and(self, other: Criteria) -> Criteria {
        match self {
            Criteria::And { mut criteria } => {
                criteria.push(other);
                Criteria::And { criteria }
            }
            this => Criteria::And {
                criteria: vec![this, other],
            },
        }
    }

    /// Disjunction; nested `Or`s are flattened.
    pub fn or(self, other: Criteria) -> Criteria {
        match self {
            Criteria::Or { mut criteria } => {
                criteria.push(other);
                Criteria::Or { criteria }
            }
            this => Criteria::Or {
                criteria: vec![this, other],
            },
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match self {
            Criteria::And { criteria } | Criteria::Or { criteria } => {
                criteria.iter().try_for_each(Criteria::validate)
            }
            Criteria::Not { criteria } => criteria.validate(),
            other => {
                let field = other.field_path().unwrap_or_default();
                if is_valid_path(field) {
                    Ok(())
                } else {
                    Err(QueryError::invalid_query(format!(
                        "invalid field path '{field}'"
                    )))
                }
            }
        }
    }

    fn field_path(&self) -> Option<&str> {
        match self {
            Criteria::Eq { field, .. }
            | Criteria::Ne { field, .. }
            | Criteria::Gt { field, .. }
            | Criteria::Gte { field, .. }
            | Criteria::Lt { field, .. }
            | Criteria::Lte { field, .. }
            | Criteria::In { field, .. }
            | Criteria::NotIn { field, .. }
            | Criteria::Like { field, .. }
            | Criteria::Exists { field }
            | Criteria::IsNull { field } => Some(field.as_str()),
            Criteria::And { .. } | Criteria::Or { .. } | Criteria::Not { .. } => None,
        }
    }

    /// Evaluates the predicate against a JSON document. A missing field never
    /// satisfies a comparison, so `Ne` and `NotIn` require the field to exist.
    pub fn matches(&self, document: &Value) -> bool {
        let ordered = |field: &str, value: &Value, accept: fn(Ordering) -> bool| {
            lookup(document, field)
                .and_then(|current| compare_values(current, value))
                .is_some_and(accept)
        };
        match self {
            Criteria::Eq { field, value } => {
                lookup(document, field).is_some_and(|current| values_equal(current, value))
            }
            Criteria::Ne { field, value } => {
                lookup(document, field).is_some_and(|current| !values_equal(current, value))
            }
            Criteria::Gt { field, value } => ordered(field, value, Ordering::is_gt),
            Criteria::Gte { field, value } => ordered(field, value, Ordering::is_ge),
            Criteria::Lt { field, value } => ordered(field, value, Ordering::is_lt),
            Criteria::Lte { field, value } => ordered(field, value, Ordering::is_le),
            Criteria::In { field, values } => lookup(document, field)
                .is_some_and(|current| values.iter().any(|v| values_equal(current, v))),
            Criteria::NotIn { field, values } => lookup(document, field)
                .is_some_and(|current| !values.iter().any(|v| values_equal(current, v))),
            Criteria::Like { field, pattern } => lookup(document, field)
                .and_then(Value::as_str)
                .is_some_and(|text| like_matches(text, pattern)),
            Criteria::Exists { field } => lookup(document, field).is_some(),
            Criteria::IsNull { field } => lookup(document, field).is_some_and(Value::is_null),
            Criteria::And { criteria } => criteria.iter().all(|c| c.matches(document)),
            Criteria::Or { criteria } => criteria.iter().any(|c| c.matches(document)),
            Criteria::Not { criteria } => !criteria.matches(document),
        }
    }
}

impl std::ops::Not for Criteria {
    type Output = Criteria;

    fn not(self) -> Self::Output {
        match self {
            Criteria::Not { criteria } => *criteria,
            this => Criteria::Not {
                criteria: Box::new(this),
            },
        }
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value}")?;
    }
    write!(f, "]")
}

fn write_joined(f: &mut fmt::Formatter<'_>, criteria: &[Criteria], operator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in criteria.iter().enumerate() {
        if i > 0 {
            write!(f, " {operator} ")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binary = |f: &mut fmt::Formatter<'_>, field: &str, operator: &str, value: &Value| {
            write_path(f, field)?;
            write!(f, " {operator} {value}")
        };
        match self {
            Criteria::Eq { field, value } => binary(f, field, "=", value),
            Criteria::Ne { field, value } => binary(f, field, "!=", value),
            Criteria::Gt { field, value } => binary(f, field, ">", value),
            Criteria::Gte { field, value } => binary(f, field, ">=", value),
            Criteria::Lt { field, value } => binary(f, field, "<", value),
            Criteria::Lte { field, value } => binary(f, field, "<=", value),
            Criteria::In { field, values } => {
                write_path(f, field)?;
                write!(f, " IN ")?;
                write_values(f, values)
            }
            Criteria::NotIn { field, values } => {
                write_path(f, field)?;
                write!(f, " NOT IN ")?;
                write_values(f, values)
            }
            Criteria::Like { field, pattern } => {
                binary(f, field, "LIKE", &Value::String(pattern.clone()))
            }
            Criteria::Exists { field } => {
                write_path(f, field)?;
                write!(f, " IS NOT MISSING")
            }
            Criteria::IsNull { field } => {
                write_path(f, field)?;
                write!(f, " IS NULL")
            }
            Criteria::And { criteria } if criteria.is_empty() => write!(f, "TRUE"),
            Criteria::Or { criteria } if criteria.is_empty() => write!(f, "FALSE"),
            Criteria::And { criteria } => write_joined(f, criteria, "AND"),
            Criteria::Or { criteria } => write_joined(f, criteria, "OR"),
            Criteria::Not { criteria } => write!(f, "NOT ({criteria})"),
        }
    }
}
