use crate::constants::{MAX_C, MAX_K_VALUE, MIN_C};
use crate::error::JpeglsError;

/// Adaptive statistics for one regular mode context (ISO/IEC 14495-1, A.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularModeContext {
    a: i32,
    b: i32,
    c: i32,
    n: i32,
}

impl RegularModeContext {
    pub fn new(range: i32) -> Self {
        Self {
            a: ((range + 32) / 64).max(2),
            b: 0,
            c: 0,
            n: 1,
        }
    }

    pub fn c(&self) -> i32 {
        self.c
    }

    /// Returns `-1` when the lossless `k == 0` error mapping of A.5.2 is inverted,
    /// `0` otherwise. Callers pass `k | near_lossless`.
    pub fn get_error_correction(&self, k: i32) -> i32 {
        if k == 0 && 2 * self.b + self.n - 1 < 0 { -1 } else { 0 }
    }

    // Code segments A.12 and A.13
    pub fn update_variables_and_bias(
        &mut self,
        error_value: i32,
        near_lossless: i32,
        reset_threshold: i32,
    ) -> Result<(), JpeglsError> {
        self.a += error_value.abs();
        self.b += error_value * (2 * near_lossless + 1);

        if self.a >= 65536 * 256 || self.b.abs() >= 65536 * 256 {
            return Err(JpeglsError::InvalidData);
        }

        if self.n == reset_threshold {
            self.a >>= 1;
            self.b >>= 1;
            self.n >>= 1;
        }

        self.n += 1;

        if self.b + self.n <= 0 {
            self.b = (self.b + self.n).max(1 - self.n);
            self.c = (self.c - 1).max(MIN_C);
        } else if self.b > 0 {
            self.b = (self.b - self.n).min(0);
            self.c = (self.c + 1).min(MAX_C);
        }
        Ok(())
    }

    pub fn compute_golomb_coding_parameter(&self) -> Result<i32, JpeglsError> {
        let mut k = 0;
        while (self.n << k) < self.a && k < MAX_K_VALUE {
            k += 1;
        }

        if k == MAX_K_VALUE {
            return Err(JpeglsError::InvalidData);
        }
        Ok(k)
    }
}
