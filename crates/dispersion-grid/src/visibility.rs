//! Visual range derived from PM2.5 concentration.
//!
//! Visual range (miles) = K / PM2.5, with concentrations below 1.0 treated
//! as 1.0 so clean air saturates at K instead of blowing up.

/// K in the visual range relation. Earlier releases of the original tool
/// used 541; 539 is the value in the current conversion.
pub const VISIBILITY_CONSTANT: f32 = 539.0;

/// Variable actually read from the file when visual range is requested.
pub const VISIBILITY_SOURCE_PARAMETER: &str = "PM25";

/// True for any spelling of "visual range" (`VISUAL_RANGE`, `visual-range`, `Visual Range`).
pub fn is_visual_range(parameter: &str) -> bool {
    let normalized: String = parameter
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .to_lowercase();
    normalized == "visualrange"
}

/// NetCDF variable to read for a requested display parameter.
pub fn source_parameter(parameter: &str) -> &str {
    if is_visual_range(parameter) {
        VISIBILITY_SOURCE_PARAMETER
    } else {
        parameter
    }
}

/// Convert one PM2.5 value to visual range.
#[inline]
pub fn pm25_to_visibility(pm25: f32) -> f32 {
    if pm25.is_nan() {
        return pm25;
    }
    VISIBILITY_CONSTANT / pm25.max(1.0)
}

/// Convert a whole buffer in place.
pub fn convert_in_place(values: &mut [f32]) {
    for v in values.iter_mut() {
        *v = pm25_to_visibility(*v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_range_spellings() {
        assert!(is_visual_range("VISUAL_RANGE"));
        assert!(is_visual_range("visual range"));
        assert!(is_visual_range("Visual-Range"));
        assert!(is_visual_range("visualrange"));
        assert!(!is_visual_range("PM25"));
        assert!(!is_visual_range("visual"));
    }

    #[test]
    fn test_source_parameter() {
        assert_eq!(source_parameter("VISUAL_RANGE"), "PM25");
        assert_eq!(source_parameter("PM25"), "PM25");
        assert_eq!(source_parameter("PCNTSIMS"), "PCNTSIMS");
    }

    #[test]
    fn test_floor_below_one() {
        assert_eq!(pm25_to_visibility(0.5), VISIBILITY_CONSTANT);
        assert_eq!(pm25_to_visibility(0.0), VISIBILITY_CONSTANT);
        assert_eq!(pm25_to_visibility(-3.0), VISIBILITY_CONSTANT);
        assert_eq!(pm25_to_visibility(1.0), VISIBILITY_CONSTANT);
    }

    #[test]
    fn test_inverse_above_one() {
        assert_eq!(pm25_to_visibility(10.0), VISIBILITY_CONSTANT / 10.0);
        assert!(pm25_to_visibility(f32::NAN).is_nan());
    }
}
