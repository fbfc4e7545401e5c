use crate::constants::MAX_K_VALUE;
use crate::error::JpeglsError;

/// Statistics for one of the two run interruption contexts (ISO/IEC 14495-1, A.7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunModeContext {
    run_interruption_type: i32,
    a: i32,
    n: i32,
    nn: i32,
}

impl RunModeContext {
    pub fn new(run_interruption_type: i32, range: i32) -> Self {
        Self {
            run_interruption_type,
            a: ((range + 32) / 64).max(2),
            n: 1,
            nn: 0,
        }
    }

    /// Golomb parameter from `A + (N / 2) * RItype` (code segment A.20).
    pub fn compute_golomb_coding_parameter(&self) -> Result<i32, JpeglsError> {
        let temp = self.a + (self.n >> 1) * self.run_interruption_type;
        let mut k = 0;
        while (self.n << k) < temp && k < MAX_K_VALUE {
            k += 1;
        }

        if k == MAX_K_VALUE {
            return Err(JpeglsError::InvalidData);
        }
        Ok(k)
    }

    // Code segment A.23
    pub fn update_variables(&mut self, error_value: i32, e_mapped_error_value: i32, reset_threshold: i32) {
        self.nn += (error_value < 0) as i32;
        self.a += (e_mapped_error_value + 1 - self.run_interruption_type) >> 1;

        if self.n == reset_threshold {
            self.a >>= 1;
            self.n >>= 1;
            self.nn >>= 1;
        }
        self.n += 1;
    }

    /// Maps an error value to `EMErrval` (code segment A.21).
    pub fn compute_mapped_error_value(&self, error_value: i32, k: i32) -> i32 {
        2 * error_value.abs() - self.run_interruption_type - self.compute_map(error_value, k) as i32
    }

    /// Inverse of [`Self::compute_mapped_error_value`].
    pub fn decode_error_value(&self, e_mapped_error_value: i32, k: i32) -> i32 {
        let temp = e_mapped_error_value + self.run_interruption_type;
        let map = temp & 1 == 1;
        let magnitude = (temp + map as i32) / 2;

        // With `map` set a negative error is coded in exactly these conditions.
        if map == (k != 0 || self.negative_errors_dominate()) {
            -magnitude
        } else {
            magnitude
        }
    }

    fn compute_map(&self, error_value: i32, k: i32) -> bool {
        match error_value.signum() {
            1 => k == 0 && !self.negative_errors_dominate(),
            -1 => k != 0 || self.negative_errors_dominate(),
            _ => false,
        }
    }

    fn negative_errors_dominate(&self) -> bool {
        2 * self.nn >= self.n
    }
}
