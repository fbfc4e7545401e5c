//! Gradient quantization, context selection and the median edge detector.

use crate::jpegls::coding_parameters::JpeglsPcParameters;
use std::cmp::{max, min};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientQuantizer {
    near_lossless: i32,
    threshold1: i32,
    threshold2: i32,
    threshold3: i32,
}

impl GradientQuantizer {
    pub fn new(preset_coding_parameters: &JpeglsPcParameters, near_lossless: i32) -> Self {
        Self {
            near_lossless,
            threshold1: preset_coding_parameters.threshold1,
            threshold2: preset_coding_parameters.threshold2,
            threshold3: preset_coding_parameters.threshold3,
        }
    }

    // Code segment A.4
    pub fn quantize_gradient(&self, di: i32) -> i32 {
        if di <= -self.threshold3 {
            -4
        } else if di <= -self.threshold2 {
            -3
        } else if di <= -self.threshold1 {
            -2
        } else if di < -self.near_lossless {
            -1
        } else if di <= self.near_lossless {
            0
        } else if di < self.threshold1 {
            1
        } else if di < self.threshold2 {
            2
        } else if di < self.threshold3 {
            3
        } else {
            4
        }
    }

    /// Signed context id of the local gradients `d1 = rd - rb`, `d2 = rb - rc`, `d3 = rc - ra`.
    pub fn compute_context_id(&self, d1: i32, d2: i32, d3: i32) -> i32 {
        compute_context_id(
            self.quantize_gradient(d1),
            self.quantize_gradient(d2),
            self.quantize_gradient(d3),
        )
    }
}

pub fn compute_context_id(q1: i32, q2: i32, q3: i32) -> i32 {
    (q1 * 9 + q2) * 9 + q3
}

/// A context id folded onto the 365 regular mode contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedContext {
    pub index: usize,
    pub sign: i32,
}

impl QuantizedContext {
    pub fn from_context_id(context_id: i32) -> Self {
        if context_id < 0 {
            Self {
                index: (-context_id) as usize,
                sign: -1,
            }
        } else {
            Self {
                index: context_id as usize,
                sign: 1,
            }
        }
    }
}

// Median edge detector, ISO/IEC 14495-1, A.4.1
pub fn get_predicted_value(ra: i32, rb: i32, rc: i32) -> i32 {
    if rc >= max(ra, rb) {
        min(ra, rb)
    } else if rc <= min(ra, rb) {
        max(ra, rb)
    } else {
        ra + rb - rc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REGULAR_MODE_CONTEXT_COUNT;
    use crate::jpegls::coding_parameters::compute_default;

    fn quantizer() -> GradientQuantizer {
        GradientQuantizer::new(&compute_default(255, 0), 0)
    }

    #[test]
    fn test_quantize_gradient_buckets() {
        let quantizer = quantizer();
        let expected = [
            (-300, -4),
            (-21, -4),
            (-20, -3),
            (-7, -3),
            (-6, -2),
            (-3, -2),
            (-2, -1),
            (-1, -1),
            (0, 0),
            (1, 1),
            (2, 1),
            (3, 2),
            (6, 2),
            (7, 3),
            (20, 3),
            (21, 4),
        ];
        for (di, q) in expected {
            assert_eq!(quantizer.quantize_gradient(di), q, "gradient {}", di);
        }
    }

    #[test]
    fn test_near_lossless_widens_zero_bucket() {
        let quantizer = GradientQuantizer::new(&compute_default(255, 2), 2);
        assert_eq!(quantizer.quantize_gradient(2), 0);
        assert_eq!(quantizer.quantize_gradient(-2), 0);
        assert_eq!(quantizer.quantize_gradient(3), 1);
        assert_eq!(quantizer.quantize_gradient(-3), -1);
    }

    #[test]
    fn test_context_symmetry_is_an_involution() {
        let quantizer = quantizer();
        for d1 in (-30..=30).step_by(3) {
            for d2 in (-30..=30).step_by(5) {
                for d3 in -9..=9 {
                    let context = QuantizedContext::from_context_id(quantizer.compute_context_id(d1, d2, d3));
                    let mirrored = QuantizedContext::from_context_id(quantizer.compute_context_id(-d1, -d2, -d3));
                    assert_eq!(context.index, mirrored.index);
                    assert!(context.index < REGULAR_MODE_CONTEXT_COUNT);
                    if context.index != 0 {
                        assert_eq!(context.sign, -mirrored.sign);
                    }
                }
            }
        }
    }

    #[test]
    fn test_context_ids_cover_all_regular_contexts() {
        let mut seen = [false; REGULAR_MODE_CONTEXT_COUNT];
        for q1 in -4..=4 {
            for q2 in -4..=4 {
                for q3 in -4..=4 {
                    seen[QuantizedContext::from_context_id(compute_context_id(q1, q2, q3)).index] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_median_edge_detector() {
        assert_eq!(get_predicted_value(10, 20, 25), 10);
        assert_eq!(get_predicted_value(10, 20, 5), 20);
        assert_eq!(get_predicted_value(10, 20, 15), 15);
        assert_eq!(get_predicted_value(0, 0, 0), 0);
    }
}
