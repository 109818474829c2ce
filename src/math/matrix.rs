use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Dense row-major matrix.
///
/// Weight matrices are stored `input_size × output_size`, so a forward pass
/// is a row vector times the matrix (`x · W`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        Matrix { rows, cols, data }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Both uniforms in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization scaled by `gain`: samples from
    /// N(0, gain · sqrt(1 / rows)). `rows` is the fan-in.
    pub fn xavier<R: Rng>(rows: usize, cols: usize, gain: f64, rng: &mut R) -> Matrix {
        let std_dev = gain * (1.0 / rows.max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in &mut res.data {
            for v in row.iter_mut() {
                *v = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| f(x)).collect())
                .collect(),
        }
    }

    /// Row vector times matrix: `x · self`. `x.len()` must equal `rows`.
    pub fn left_mul(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.rows, "Matrices are of incorrect sizes");
        let mut out = vec![0.0; self.cols];
        for (xi, row) in x.iter().zip(&self.data) {
            if *xi == 0.0 {
                continue;
            }
            for (o, w) in out.iter_mut().zip(row) {
                *o += xi * w;
            }
        }
        out
    }

    /// Row vector times transpose: `d · selfᵀ`. `d.len()` must equal `cols`.
    pub fn left_mul_transposed(&self, d: &[f64]) -> Vec<f64> {
        assert_eq!(d.len(), self.cols, "Matrices are of incorrect sizes");
        self.data.iter()
            .map(|row| row.iter().zip(d).map(|(w, di)| w * di).sum())
            .collect()
    }

    /// Accumulates the outer product `xᵀ · d` in place.
    pub fn add_outer(&mut self, x: &[f64], d: &[f64]) {
        assert_eq!(x.len(), self.rows);
        assert_eq!(d.len(), self.cols);
        for (xi, row) in x.iter().zip(self.data.iter_mut()) {
            if *xi == 0.0 {
                continue;
            }
            for (v, di) in row.iter_mut().zip(d) {
                *v += xi * di;
            }
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for row in &mut self.data {
            for v in row.iter_mut() {
                *v *= factor;
            }
        }
    }

    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|v| v * v).sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().flatten().fold(0.0, |m, v| m.max(v.abs()))
    }
}
