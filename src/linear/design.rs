use crate::linalg::{prepend_ones, IntoFaer, LinalgErrors};
use faer::{Mat, MatRef};
use ndarray::ArrayView2;

pub const INTERCEPT_NAME: &str = "(Intercept)";

/// An n x p matrix of predictors with one name per column.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    names: Vec<String>,
    data: Mat<f64>,
}

impl DesignMatrix {
    pub fn new(data: Mat<f64>, names: Vec<String>) -> Result<Self, LinalgErrors> {
        if names.len() != data.ncols() {
            return Err(LinalgErrors::DimensionMismatch(format!(
                "{} column names given for {} columns",
                names.len(),
                data.ncols()
            )));
        }
        Ok(Self { names, data })
    }

    /// Columns are named x1, x2, ...
    pub fn from_mat(data: Mat<f64>) -> Self {
        let names = (1..=data.ncols()).map(|j| format!("x{}", j)).collect();
        Self { names, data }
    }

    pub fn from_ndarray(data: ArrayView2<'_, f64>, names: Vec<String>) -> Result<Self, LinalgErrors> {
        Self::new(data.into_faer(), names)
    }

    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self, LinalgErrors> {
        let n = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if let Some(j) = columns.iter().position(|(_, c)| c.len() != n) {
            return Err(LinalgErrors::DimensionMismatch(format!(
                "column {} has {} rows, expected {}",
                j,
                columns[j].1.len(),
                n
            )));
        }
        let data = Mat::from_fn(n, columns.len(), |i, j| columns[j].1[i]);
        let names = columns.into_iter().map(|(s, _)| s.into()).collect();
        Ok(Self { names, data })
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn as_ref(&self) -> MatRef<'_, f64> {
        self.data.as_ref()
    }

    pub fn into_inner(self) -> Mat<f64> {
        self.data
    }

    pub fn has_intercept(&self) -> bool {
        self.names.first().map(|s| s == INTERCEPT_NAME).unwrap_or(false)
    }

    /// Prepends a column of ones named `(Intercept)`.
    pub fn with_intercept(&self) -> Self {
        let mut names = Vec::with_capacity(self.names.len() + 1);
        names.push(INTERCEPT_NAME.to_string());
        names.extend(self.names.iter().cloned());
        Self {
            names,
            data: prepend_ones(self.data.as_ref()),
        }
    }

    /// Concatenates the columns of `other` to the right of `self`.
    pub fn hstack(&self, other: &DesignMatrix) -> Result<Self, LinalgErrors> {
        if self.nrows() != other.nrows() {
            return Err(LinalgErrors::DimensionMismatch(format!(
                "cannot stack designs with {} and {} rows",
                self.nrows(),
                other.nrows()
            )));
        }
        let data = faer::concat![[self.data, other.data]];
        let names = self.names.iter().chain(other.names.iter()).cloned().collect();
        Ok(Self { names, data })
    }
}
