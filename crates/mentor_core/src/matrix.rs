use serde::{Deserialize, Serialize};

use crate::error::{MentorError, Result};

/// Dense row-major embedding matrix: one row per stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if dim == 0 {
            return Err(MentorError::validation("embedding rows must be non-empty"));
        }

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(MentorError::validation(format!(
                    "embedding row {i} has width {}, expected {dim}",
                    row.len()
                )));
            }
            data.extend(row);
        }

        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row_count(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim.max(1))
    }

    /// A deserialised matrix is trusted only once its buffer splits evenly.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.dim > 0 && self.data.len() % self.dim == 0
    }
}
