use crate::constants::DEFAULT_RESET_THRESHOLD;
use crate::error::JpeglsError;
use crate::jpegls::InterleaveMode;
use std::cmp::{max, min};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingParameters {
    pub near_lossless: i32,
    pub interleave_mode: InterleaveMode,
}

impl Default for CodingParameters {
    fn default() -> Self {
        Self {
            near_lossless: 0,
            interleave_mode: InterleaveMode::None,
        }
    }
}

/// Preset coding parameters (`MAXVAL`, `T1`, `T2`, `T3`, `RESET`).
///
/// A zero field means "use the default", as in the LSE segment (ISO/IEC 14495-1, C.2.4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JpeglsPcParameters {
    pub maximum_sample_value: i32,
    pub threshold1: i32,
    pub threshold2: i32,
    pub threshold3: i32,
    pub reset_value: i32,
}

// Clamping function as defined by ISO/IEC 14495-1, Figure C.3
const fn clamp(i: i32, j: i32, maximum_sample_value: i32) -> i32 {
    if i > maximum_sample_value || i < j {
        j
    } else {
        i
    }
}

pub fn compute_maximum_near_lossless(maximum_sample_value: i32) -> i32 {
    debug_assert!(maximum_sample_value >= 1);
    min(255, maximum_sample_value / 2)
}

// Table C.3 thresholds for MAXVAL = 255 and NEAR = 0, the floor each scaled
// threshold keeps, and the NEAR multiplier added to it (Figure C.3).
const BASIC_THRESHOLDS: [i32; 3] = [3, 7, 21];
const THRESHOLD_FLOORS: [i32; 3] = [2, 3, 4];
const THRESHOLD_NEAR_FACTORS: [i32; 3] = [3, 5, 7];

// Default coding threshold values as defined by ISO/IEC 14495-1, C.2.4.1.1.1
pub fn compute_default(maximum_sample_value: i32, near_lossless: i32) -> JpeglsPcParameters {
    debug_assert!(maximum_sample_value <= u16::MAX as i32);
    debug_assert!(near_lossless >= 0 && near_lossless <= compute_maximum_near_lossless(maximum_sample_value));

    let mut thresholds = [0; 3];
    let mut lower_bound = near_lossless + 1;
    for (i, threshold) in thresholds.iter_mut().enumerate() {
        let near_term = THRESHOLD_NEAR_FACTORS[i] * near_lossless;
        let scaled = if maximum_sample_value >= 128 {
            let factor = (min(maximum_sample_value, 4095) + 128) / 256;
            factor * (BASIC_THRESHOLDS[i] - THRESHOLD_FLOORS[i]) + THRESHOLD_FLOORS[i] + near_term
        } else {
            let factor = 256 / (maximum_sample_value + 1);
            max(THRESHOLD_FLOORS[i], BASIC_THRESHOLDS[i] / factor + near_term)
        };
        *threshold = clamp(scaled, lower_bound, maximum_sample_value);
        lower_bound = *threshold;
    }

    JpeglsPcParameters {
        maximum_sample_value,
        threshold1: thresholds[0],
        threshold2: thresholds[1],
        threshold3: thresholds[2],
        reset_value: DEFAULT_RESET_THRESHOLD,
    }
}

/// True when the parameters are all zero or equal to `defaults`; no LSE segment is needed then.
pub fn is_default(preset_coding_parameters: &JpeglsPcParameters, defaults: &JpeglsPcParameters) -> bool {
    *preset_coding_parameters == JpeglsPcParameters::default() || preset_coding_parameters == defaults
}

/// Validates preset parameters against ISO/IEC 14495-1, C.2.4.1.1, Table C.1 and
/// replaces zero fields by their defaults.
pub fn is_valid(
    pc_parameters: &JpeglsPcParameters,
    maximum_component_value: i32,
    near_lossless: i32,
) -> Result<JpeglsPcParameters, JpeglsError> {
    debug_assert!(maximum_component_value >= 3 && maximum_component_value <= u16::MAX as i32);

    // Zero selects the default and is always accepted.
    let check = |value: i32, low: i32, high: i32| {
        if value == 0 || (low..=high).contains(&value) {
            Ok(())
        } else {
            Err(JpeglsError::InvalidParameterJpeglsPresetParameters)
        }
    };
    let or_default = |value: i32, default: i32| if value != 0 { value } else { default };

    check(pc_parameters.maximum_sample_value, 1, maximum_component_value)?;
    let maximum_sample_value = or_default(pc_parameters.maximum_sample_value, maximum_component_value);
    if near_lossless > compute_maximum_near_lossless(maximum_sample_value) {
        return Err(JpeglsError::InvalidParameterNearLossless);
    }
    let defaults = compute_default(maximum_sample_value, near_lossless);

    check(pc_parameters.threshold1, near_lossless + 1, maximum_sample_value)?;
    let threshold1 = or_default(pc_parameters.threshold1, defaults.threshold1);
    check(pc_parameters.threshold2, threshold1, maximum_sample_value)?;
    let threshold2 = or_default(pc_parameters.threshold2, defaults.threshold2);
    check(pc_parameters.threshold3, threshold2, maximum_sample_value)?;
    check(pc_parameters.reset_value, 3, max(255, maximum_sample_value))?;

    Ok(JpeglsPcParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3: or_default(pc_parameters.threshold3, defaults.threshold3),
        reset_value: or_default(pc_parameters.reset_value, defaults.reset_value),
    })
}

// RANGE as defined in ISO/IEC 14495-1, A.2.1
pub fn compute_range(maximum_sample_value: i32, near_lossless: i32) -> i32 {
    if near_lossless == 0 {
        maximum_sample_value + 1
    } else {
        (maximum_sample_value + 2 * near_lossless) / (2 * near_lossless + 1) + 1
    }
}

/// Number of bits needed to hold `value - 1`, i.e. `ceil(log2(value))`.
pub fn log2_ceil(value: i32) -> i32 {
    debug_assert!(value > 0);
    32 - (value - 1).leading_zeros() as i32
}

// bpp as defined in ISO/IEC 14495-1, A.2.1
pub fn compute_bits_per_pixel(maximum_sample_value: i32) -> i32 {
    max(2, log2_ceil(maximum_sample_value + 1))
}

// LIMIT as defined in ISO/IEC 14495-1, A.2.1
pub fn compute_limit_parameter(bits_per_pixel: i32) -> i32 {
    2 * (bits_per_pixel + max(8, bits_per_pixel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_8_bit() {
        let pc = compute_default(255, 0);
        assert_eq!((pc.threshold1, pc.threshold2, pc.threshold3, pc.reset_value), (3, 7, 21, 64));
    }

    #[test]
    fn test_default_thresholds_16_bit() {
        let pc = compute_default(65535, 0);
        assert_eq!((pc.threshold1, pc.threshold2, pc.threshold3), (18, 67, 276));
    }

    #[test]
    fn test_default_thresholds_near_lossless() {
        let pc = compute_default(255, 2);
        assert_eq!((pc.threshold1, pc.threshold2, pc.threshold3), (9, 17, 35));
        assert!(pc.threshold1 > 2);
    }

    #[test]
    fn test_default_thresholds_low_bit_depth() {
        // MAXVAL = 15: factor = 16, every threshold falls back to its minimum.
        let pc = compute_default(15, 0);
        assert_eq!((pc.threshold1, pc.threshold2, pc.threshold3), (2, 3, 4));
    }

    #[test]
    fn test_is_valid_fills_defaults() {
        let validated = is_valid(&JpeglsPcParameters::default(), 255, 0).unwrap();
        assert_eq!(validated, compute_default(255, 0));

        let custom = JpeglsPcParameters {
            threshold1: 4,
            ..Default::default()
        };
        let validated = is_valid(&custom, 255, 0).unwrap();
        assert_eq!(validated.threshold1, 4);
        assert_eq!(validated.threshold2, 7);
    }

    #[test]
    fn test_is_valid_rejects_out_of_order_thresholds() {
        let pc = JpeglsPcParameters {
            maximum_sample_value: 255,
            threshold1: 10,
            threshold2: 5,
            threshold3: 21,
            reset_value: 64,
        };
        assert_eq!(is_valid(&pc, 255, 0), Err(JpeglsError::InvalidParameterJpeglsPresetParameters));
        assert_eq!(
            is_valid(&JpeglsPcParameters::default(), 255, 200),
            Err(JpeglsError::InvalidParameterNearLossless)
        );
    }

    #[test]
    fn test_is_default() {
        let defaults = compute_default(255, 0);
        assert!(is_default(&JpeglsPcParameters::default(), &defaults));
        assert!(is_default(&defaults, &defaults));
        let custom = JpeglsPcParameters {
            reset_value: 32,
            ..defaults
        };
        assert!(!is_default(&custom, &defaults));
    }

    #[test]
    fn test_range_and_limit() {
        assert_eq!(compute_range(255, 0), 256);
        assert_eq!(compute_range(255, 2), 52);
        assert_eq!(log2_ceil(256), 8);
        assert_eq!(log2_ceil(257), 9);
        assert_eq!(log2_ceil(52), 6);
        assert_eq!(compute_bits_per_pixel(255), 8);
        assert_eq!(compute_bits_per_pixel(1), 2);
        assert_eq!(compute_limit_parameter(8), 32);
        assert_eq!(compute_limit_parameter(16), 64);
    }
}
