//! One-hot context encoder
//!
//! Each of the six context fields gets its own block of indicator columns.
//! Categories are sorted per field at fit time and never reordered, so the
//! same context always encodes to the same vector.

use crate::context::{normalize_category, ContextField, UserContext, CONTEXT_FIELDS};
use crate::vector::Vector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fitted one-hot encoder for user contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEncoder {
    /// Sorted categories per field, in [`ContextField::ALL`] order
    categories: Vec<Vec<String>>,
    /// Start column of each field block
    offsets: Vec<usize>,
    dim: usize,
}

impl ContextEncoder {
    /// Fit category sets from normalized six-field rows
    pub fn fit<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let mut sets: Vec<BTreeSet<String>> = vec![BTreeSet::new(); CONTEXT_FIELDS];
        for row in rows {
            for (set, value) in sets.iter_mut().zip(row.as_ref()) {
                let value = normalize_category(value);
                if !value.is_empty() {
                    set.insert(value);
                }
            }
        }
        Self::from_categories(sets.into_iter().map(|s| s.into_iter().collect()).collect())
    }

    /// Fit from user contexts, rejecting incomplete ones
    pub fn fit_contexts<'a, I>(contexts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a UserContext>,
    {
        let rows = contexts
            .into_iter()
            .map(|ctx| ctx.values())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::fit(rows.iter().map(|r| r.as_slice())))
    }

    fn from_categories(categories: Vec<Vec<String>>) -> Self {
        let mut offsets = Vec::with_capacity(categories.len());
        let mut dim = 0;
        for field in &categories {
            offsets.push(dim);
            dim += field.len();
        }
        Self {
            categories,
            offsets,
            dim,
        }
    }

    /// Width of the encoded vector
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Known categories of a field, in column order
    pub fn categories(&self, field: ContextField) -> &[String] {
        self.categories
            .get(field.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Encode already normalized values
    ///
    /// An unknown value leaves its field block all-zero.
    pub fn transform_values<S: AsRef<str>>(&self, values: &[S]) -> Result<Vector> {
        if values.len() != CONTEXT_FIELDS {
            return Err(Error::InvalidDimension {
                expected: CONTEXT_FIELDS,
                actual: values.len(),
            });
        }

        let mut encoded = Vector::zeros(self.dim);
        let slots = encoded.as_mut_slice();
        for (field, value) in values.iter().enumerate() {
            let column = self.categories.get(field).and_then(|known| {
                known
                    .binary_search_by(|c| c.as_str().cmp(value.as_ref()))
                    .ok()
                    .map(|pos| self.offsets[field] + pos)
            });
            if let Some(column) = column {
                slots[column] = 1.0;
            } else {
                tracing::debug!(
                    field = %ContextField::ALL[field],
                    value = value.as_ref(),
                    "unknown context value; encoding as all-zero"
                );
            }
        }
        Ok(encoded)
    }

    /// Encode a user context
    ///
    /// Missing fields fail with [`Error::InvalidContext`].
    pub fn transform(&self, context: &UserContext) -> Result<Vector> {
        let values = context.values()?;
        self.transform_values(&values)
    }
}
