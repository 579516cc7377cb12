use crate::output::error::OutputError;
use crate::types::metadata::VariableDescriptor;
use polars::prelude::{lit, Expr};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// A linear unit conversion applied to a variable column on output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitConversion {
    Identity,
    CelsiusToFahrenheit,
    MillimetersToInches,
}

impl UnitConversion {
    /// The conversion a descriptor asks for. Descriptors with `convert == false`
    /// are always [`UnitConversion::Identity`].
    pub fn for_descriptor(
        variable: &str,
        descriptor: &VariableDescriptor,
    ) -> Result<Self, OutputError> {
        if !descriptor.convert {
            return Ok(UnitConversion::Identity);
        }
        let target = descriptor
            .convert_unit
            .as_deref()
            .ok_or_else(|| OutputError::MissingTargetUnit(variable.to_string()))?;
        Self::between(&descriptor.native_unit, target).ok_or_else(|| {
            OutputError::UnsupportedConversion {
                variable: variable.to_string(),
                from: descriptor.native_unit.clone(),
                to: target.to_string(),
            }
        })
    }

    /// Looks up the conversion between two unit spellings, if supported.
    pub fn between(from: &str, to: &str) -> Option<Self> {
        let from = canonical_unit(from);
        let to = canonical_unit(to);
        match (from.as_str(), to.as_str()) {
            (a, b) if a == b => Some(UnitConversion::Identity),
            ("degC", "degF") => Some(UnitConversion::CelsiusToFahrenheit),
            ("mm", "in") => Some(UnitConversion::MillimetersToInches),
            _ => None,
        }
    }

    pub fn convert(self, value: f64) -> f64 {
        match self {
            UnitConversion::Identity => value,
            UnitConversion::CelsiusToFahrenheit => value * 9.0 / 5.0 + 32.0,
            UnitConversion::MillimetersToInches => value / MM_PER_INCH,
        }
    }

    /// The same conversion as a polars expression.
    pub fn apply(self, expr: Expr) -> Expr {
        match self {
            UnitConversion::Identity => expr,
            UnitConversion::CelsiusToFahrenheit => expr * lit(9.0) / lit(5.0) + lit(32.0),
            UnitConversion::MillimetersToInches => expr / lit(MM_PER_INCH),
        }
    }
}

fn canonical_unit(unit: &str) -> String {
    match unit.trim() {
        "degC" | "degree_C" | "degrees C" | "celsius" | "C" => "degC".to_string(),
        "degF" | "degree_F" | "degrees F" | "fahrenheit" | "F" => "degF".to_string(),
        "mm" | "millimeter" | "millimeters" => "mm".to_string(),
        "in" | "inch" | "inches" => "in".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::metadata::OutputMetadata;

    #[test]
    fn test_between_known_units() {
        assert_eq!(
            UnitConversion::between("degC", "degF"),
            Some(UnitConversion::CelsiusToFahrenheit)
        );
        assert_eq!(
            UnitConversion::between("millimeter", "inches"),
            Some(UnitConversion::MillimetersToInches)
        );
        assert_eq!(UnitConversion::between("Pa", "Pa"), Some(UnitConversion::Identity));
        assert_eq!(UnitConversion::between("degF", "degC"), None);
    }

    #[test]
    fn test_convert_values() {
        assert!((UnitConversion::CelsiusToFahrenheit.convert(100.0) - 212.0).abs() < 1e-9);
        assert!((UnitConversion::CelsiusToFahrenheit.convert(-40.0) + 40.0).abs() < 1e-9);
        assert!((UnitConversion::MillimetersToInches.convert(25.4) - 1.0).abs() < 1e-12);
        assert_eq!(UnitConversion::Identity.convert(3.5), 3.5);
    }

    #[test]
    fn test_daymet_descriptors() {
        let metadata = OutputMetadata::daymet_nhru();
        let lookup = |name: &str| {
            UnitConversion::for_descriptor(name, metadata.variable(name).unwrap()).unwrap()
        };
        assert_eq!(lookup("tmax"), UnitConversion::CelsiusToFahrenheit);
        assert_eq!(lookup("prcp"), UnitConversion::MillimetersToInches);
        assert_eq!(lookup("swe"), UnitConversion::Identity);
    }

    #[test]
    fn test_unsupported_conversion_names_variable() {
        let descriptor =
            VariableDescriptor::converted("srad", "radiation", "srad", "W m-2", "MJ m-2 d-1");
        let err = UnitConversion::for_descriptor("srad", &descriptor).unwrap_err();
        assert!(matches!(err, OutputError::UnsupportedConversion { ref variable, .. } if variable == "srad"));
    }

    #[test]
    fn test_missing_target_unit() {
        let mut descriptor = VariableDescriptor::native("vp", "vapor pressure", "vp", "Pa");
        descriptor.convert = true;
        assert!(matches!(
            UnitConversion::for_descriptor("vp", &descriptor),
            Err(OutputError::MissingTargetUnit(_))
        ));
    }
}
