//! The output metadata dictionary handed to the finalize step.
//!
//! Serializes to the key layout the weighting engine reads: fixed `dims`,
//! `feature`, `lat` and `lon` entries plus one entry per climate variable.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Output dimension names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub feature: String,
    pub time: String,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub varname: String,
    pub long_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateDescriptor {
    pub varname: String,
    pub long_name: String,
    pub units: String,
    pub standard_name: String,
}

/// Naming and unit handling of one climate variable in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub varname: String,
    pub long_name: String,
    pub standard_name: String,
    /// Whether values are converted from `native_unit` to `convert_unit`.
    #[serde(default)]
    pub convert: bool,
    pub native_unit: String,
    /// Written as the string `"None"` when absent.
    #[serde(default, with = "none_as_string")]
    pub convert_unit: Option<String>,
}

impl VariableDescriptor {
    /// A variable written in its native unit.
    pub fn native(
        varname: impl Into<String>,
        long_name: impl Into<String>,
        standard_name: impl Into<String>,
        native_unit: impl Into<String>,
    ) -> Self {
        Self {
            varname: varname.into(),
            long_name: long_name.into(),
            standard_name: standard_name.into(),
            convert: false,
            native_unit: native_unit.into(),
            convert_unit: None,
        }
    }

    /// A variable converted from `native_unit` to `convert_unit` on output.
    pub fn converted(
        varname: impl Into<String>,
        long_name: impl Into<String>,
        standard_name: impl Into<String>,
        native_unit: impl Into<String>,
        convert_unit: impl Into<String>,
    ) -> Self {
        Self {
            convert: true,
            convert_unit: Some(convert_unit.into()),
            ..Self::native(varname, long_name, standard_name, native_unit)
        }
    }

    /// Unit the variable ends up in.
    pub fn output_unit(&self) -> &str {
        match (&self.convert_unit, self.convert) {
            (Some(unit), true) => unit,
            _ => &self.native_unit,
        }
    }
}

mod none_as_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or("None"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|unit| unit != "None"))
    }
}

/// Static description of one run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub dims: Dimensions,
    pub feature: FeatureDescriptor,
    pub lat: CoordinateDescriptor,
    pub lon: CoordinateDescriptor,
    /// Keyed by catalog variable name.
    #[serde(flatten)]
    pub variables: BTreeMap<String, VariableDescriptor>,
}

impl OutputMetadata {
    pub fn new(
        dims: Dimensions,
        feature: FeatureDescriptor,
        lat: CoordinateDescriptor,
        lon: CoordinateDescriptor,
    ) -> Self {
        Self {
            dims,
            feature,
            lat,
            lon,
            variables: BTreeMap::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, descriptor: VariableDescriptor) -> Self {
        self.variables.insert(name.into(), descriptor);
        self
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.get(name)
    }

    /// Names in `variables` that have no descriptor, in input order.
    pub fn missing<'a>(&self, variables: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        variables
            .into_iter()
            .filter(|name| !self.variables.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Feature, latitude and longitude descriptors for NHM hydrologic response units.
    pub fn nhru() -> Self {
        Self::new(
            Dimensions {
                feature: "nhru".to_string(),
                time: "time".to_string(),
                x: "lon".to_string(),
                y: "lat".to_string(),
            },
            FeatureDescriptor {
                varname: "nhru".to_string(),
                long_name: "local model Hydrologic Response Unit ID (HRU)".to_string(),
            },
            CoordinateDescriptor {
                varname: "lat".to_string(),
                long_name: "Latitude of HRU centroid".to_string(),
                units: "degree_north".to_string(),
                standard_name: "latitude".to_string(),
            },
            CoordinateDescriptor {
                varname: "lon".to_string(),
                long_name: "Longitude of HRU centroid".to_string(),
                units: "degree_east".to_string(),
                standard_name: "longitude".to_string(),
            },
        )
    }

    /// Daymet daily variables on NHM HRUs, temperatures in degF and
    /// precipitation in inches.
    pub fn daymet_nhru() -> Self {
        Self::nhru()
            .with_variable(
                "tmax",
                VariableDescriptor::converted(
                    "tmax",
                    "Daily maximum temperature",
                    "maximum_daily_air_temperature",
                    "degC",
                    "degF",
                ),
            )
            .with_variable(
                "tmin",
                VariableDescriptor::converted(
                    "tmin",
                    "Daily minimum temperature",
                    "minimum_daily_air_temperature",
                    "degC",
                    "degF",
                ),
            )
            .with_variable(
                "prcp",
                VariableDescriptor::converted(
                    "prcp",
                    "Daily total precipitation",
                    "prcp",
                    "millimeter",
                    "inches",
                ),
            )
            .with_variable(
                "srad",
                VariableDescriptor::native(
                    "srad",
                    "Daylight average incident shortwave radiation",
                    "srad",
                    "W m-2",
                ),
            )
            .with_variable(
                "swe",
                VariableDescriptor::native("swe", "Snow water equivalent", "swe", "kg m-2"),
            )
            .with_variable(
                "vp",
                VariableDescriptor::native("vp", "Daily average vapor pressure", "vp", "Pa"),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_daymet_preset_serializes_engine_layout() {
        let value = serde_json::to_value(OutputMetadata::daymet_nhru()).unwrap();

        assert_eq!(
            value["dims"],
            json!({"feature": "nhru", "time": "time", "x": "lon", "y": "lat"})
        );
        assert_eq!(value["feature"]["varname"], json!("nhru"));
        assert_eq!(value["lat"]["units"], json!("degree_north"));
        assert_eq!(value["lon"]["standard_name"], json!("longitude"));
        assert_eq!(
            value["tmax"],
            json!({
                "varname": "tmax",
                "long_name": "Daily maximum temperature",
                "standard_name": "maximum_daily_air_temperature",
                "convert": true,
                "native_unit": "degC",
                "convert_unit": "degF"
            })
        );
        assert_eq!(value["vp"]["convert"], json!(false));
        assert_eq!(value["vp"]["convert_unit"], json!("None"));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn test_round_trip_reads_none_string() {
        let metadata = OutputMetadata::daymet_nhru();
        let text = serde_json::to_string(&metadata).unwrap();
        let back: OutputMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(back, metadata);
        assert_eq!(back.variable("swe").unwrap().convert_unit, None);
    }

    #[test]
    fn test_missing_descriptors() {
        let metadata = OutputMetadata::daymet_nhru();
        assert!(metadata.missing(["tmax", "vp"]).is_empty());
        assert_eq!(metadata.missing(["tmax", "PDSI", "tmean"]), vec!["PDSI", "tmean"]);
    }

    #[test]
    fn test_output_unit() {
        let metadata = OutputMetadata::daymet_nhru();
        assert_eq!(metadata.variable("tmin").unwrap().output_unit(), "degF");
        assert_eq!(metadata.variable("srad").unwrap().output_unit(), "W m-2");
    }
}
