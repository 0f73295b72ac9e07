//! Dense row-major matrices over GF(2^8): Cauchy/Vandermonde construction,
//! submatrix extraction, Gauss-Jordan inversion, and multiplication.
//!
//! Grounded on the teacher's `reed_solomon/reedsolomon.rs::Matrix` (row-major
//! `Vec<u8>`, `new`/`get`/`set`/`row`/`swap_rows`) generalized from
//! `Vec<Galois16>` to `Vec<u8>` since this spec needs runtime-sized N/K up to
//! 255, not the teacher's fixed PAR2 shapes. `invert()`'s partial-pivot /
//! shadow-identity / skip-if-pivot-is-1 algorithm and `cauchy()`/
//! `vandermonde()` are grounded directly on `original_source/rs.c`.

use crate::error::RsError;
use crate::gf::{gf_div, gf_mul};

/// A dense, row-major matrix of GF(2^8) elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    data: Vec<u8>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0u8; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: u8) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let cols = self.cols;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.data.split_at_mut(hi * cols);
        left[lo * cols..lo * cols + cols].swap_with_slice(&mut right[..cols]);
    }

    /// The identity matrix of size `n x n`.
    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::new(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    /// Copy out the rectangle `[rmin,rmax) x [cmin,cmax)`.
    pub fn submatrix(&self, rmin: usize, cmin: usize, rmax: usize, cmax: usize) -> Matrix {
        let mut out = Matrix::new(rmax - rmin, cmax - cmin);
        for i in rmin..rmax {
            for j in cmin..cmax {
                out.set(i - rmin, j - cmin, self.get(i, j));
            }
        }
        out
    }

    /// Copy out an arbitrary list of rows, in the order given.
    pub fn select_rows(&self, row_ids: &[usize]) -> Matrix {
        let mut out = Matrix::new(row_ids.len(), self.cols);
        for (out_r, &src_r) in row_ids.iter().enumerate() {
            out.data[out_r * self.cols..(out_r + 1) * self.cols]
                .copy_from_slice(self.row(src_r));
        }
        out
    }

    /// `C = A * B` over GF(2^8).
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows, "matrix dimension mismatch");
        let mut out = Matrix::new(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0 {
                    continue;
                }
                for j in 0..other.cols {
                    let b = other.get(k, j);
                    if b == 0 {
                        continue;
                    }
                    let cur = out.get(i, j);
                    out.set(i, j, cur ^ gf_mul(a, b));
                }
            }
        }
        out
    }

    pub fn is_identity(&self) -> bool {
        if self.rows != self.cols {
            return false;
        }
        for i in 0..self.rows {
            for j in 0..self.cols {
                let expect = if i == j { 1 } else { 0 };
                if self.get(i, j) != expect {
                    return false;
                }
            }
        }
        true
    }

    /// In-place Gauss-Jordan inversion. `self` must be square. Partial-pivots
    /// on the first nonzero entry in the column below the current row,
    /// swapping rows of both `self` and a shadow identity; rescales the
    /// pivot row to unity (skipped when the pivot is already 1) and
    /// eliminates every other row. Returns the error naming the column at
    /// which no pivot could be found if the matrix is singular.
    pub fn invert(&mut self) -> Result<(), RsError> {
        assert_eq!(self.rows, self.cols, "invert requires a square matrix");
        let n = self.rows;
        let mut inverse = Matrix::identity(n);

        for i in 0..n {
            if self.get(i, i) == 0 {
                let mut found = None;
                for j in (i + 1)..n {
                    if self.get(j, i) != 0 {
                        found = Some(j);
                        break;
                    }
                }
                match found {
                    Some(j) => {
                        self.swap_rows(i, j);
                        inverse.swap_rows(i, j);
                    }
                    None => return Err(RsError::SingularMatrix(i)),
                }
            }

            let pivot = self.get(i, i);
            if pivot != 1 {
                let scale = gf_div(1, pivot);
                for k in 0..n {
                    let v = gf_mul(self.get(i, k), scale);
                    self.set(i, k, v);
                    let iv = gf_mul(inverse.get(i, k), scale);
                    inverse.set(i, k, iv);
                }
            }

            for j in 0..n {
                if j == i {
                    continue;
                }
                let factor = self.get(j, i);
                if factor == 0 {
                    continue;
                }
                for k in 0..n {
                    let v = self.get(j, k) ^ gf_mul(factor, self.get(i, k));
                    self.set(j, k, v);
                    let iv = inverse.get(j, k) ^ gf_mul(factor, inverse.get(i, k));
                    inverse.set(j, k, iv);
                }
            }
        }

        self.data = inverse.data;
        Ok(())
    }
}

/// `M[i,j] = EXP[(i*j) mod 255]`, first row/column forced to 1. Reference
/// construction; not recommended near `K=255` because some square
/// submatrices may be singular.
pub fn vandermonde(rows: usize, cols: usize) -> Matrix {
    let mut m = Matrix::new(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let v = if i == 0 || j == 0 {
                1
            } else {
                crate::gf::gf_pow(2, ((i * j) % 255) as u32)
            };
            m.set(i, j, v);
        }
    }
    m
}

/// `M[i,j] = 1 / (i xor (rows+j))`. Guarantees every square submatrix is
/// invertible. `rows` here is `N` (total shards); `i` ranges `[0,N)` and `j`
/// ranges `[0,K)`, so `i` and `rows+j` can never coincide while `rows+K <=
/// 255` (see SPEC_FULL.md §9, resolved open question 3).
pub fn cauchy(rows: usize, cols: usize) -> Matrix {
    assert!(
        rows + cols <= 255,
        "cauchy: rows+cols must be <= 255 to keep denominators off zero"
    );
    let mut m = Matrix::new(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let denom = (i as u8) ^ ((rows + j) as u8);
            m.set(i, j, gf_div(1, denom));
        }
    }
    m
}
