use crate::QueryError;
use crate::ScanConsistency;
use crate::query::criteria::Criteria;
use crate::query::sorter::Sorter;
use crate::query::value::is_valid_path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter, ordering, paging and projection of a query.
///
/// `Query::new()` matches every document. The optional scan consistency is an
/// override: when set, it replaces whatever consistency the builder chain had
/// when the query is passed to `matching`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Query {
    criteria: Option<Criteria>,
    scan_consistency: Option<ScanConsistency>,
    projection: Option<Vec<String>>,
    sort: Vec<Sorter>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate; successive calls are combined with `AND`.
    #[must_use]
    pub fn with_criteria(self, criteria: Criteria) -> Self {
        let criteria = match self.criteria {
            Some(existing) => existing.and(criteria),
            None => criteria,
        };
        Self {
            criteria: Some(criteria),
            ..self
        }
    }

    #[must_use]
    pub fn with_scan_consistency(self, scan_consistency: ScanConsistency) -> Self {
        Self {
            scan_consistency: Some(scan_consistency),
            ..self
        }
    }

    #[must_use]
    pub fn with_projection<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projection: Some(fields.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sorter: Sorter) -> Self {
        self.sort.push(sorter);
        self
    }

    #[must_use]
    pub fn with_skip(self, skip: u64) -> Self {
        Self {
            skip: Some(skip),
            ..self
        }
    }

    #[must_use]
    pub fn with_limit(self, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    pub fn criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    pub fn scan_consistency(&self) -> Option<ScanConsistency> {
        self.scan_consistency
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    pub fn sort(&self) -> &[Sorter] {
        &self.sort
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if let Some(criteria) = &self.criteria {
            criteria.validate()?;
        }
        let fields = self
            .projection
            .iter()
            .flatten()
            .chain(self.sort.iter().map(|s| &s.field));
        for field in fields {
            if !is_valid_path(field) {
                return Err(QueryError::invalid_query(format!(
                    "invalid field path '{field}'"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.criteria {
            Some(criteria) => write!(f, "WHERE {criteria}")?,
            None => write!(f, "WHERE TRUE")?,
        }
        for (i, sorter) in self.sort.iter().enumerate() {
            if i == 0 {
                write!(f, " ORDER BY {sorter}")?;
            } else {
                write!(f, ", {sorter}")?;
            }
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(skip) = self.skip {
            write!(f, " OFFSET {skip}")?;
        }
        Ok(())
    }
}
