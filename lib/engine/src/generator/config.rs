use serde::Deserialize;

/// The default pattern used to parse date dimensions (`chrono` format syntax).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps a column to a dimension property.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DimensionConfig {
    pub column: String,
    pub property: String,
    /// An IRI template containing `{value}`. If present, values become IRIs.
    pub value_template: Option<String>,
    /// A datatype hint. `date` (or `xsd:date`) values are parsed with the date format.
    pub datatype: Option<String>,
    /// Key dimension values identify an observation and make up its IRI.
    pub key_dimension: bool,
}

impl DimensionConfig {
    pub fn new(column: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            property: property.into(),
            ..Self::default()
        }
    }

    /// Marks the dimension as a key dimension.
    #[must_use]
    pub fn key(mut self) -> Self {
        self.key_dimension = true;
        self
    }
}

/// Maps a column to a measure property.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasureConfig {
    pub column: String,
    pub property: String,
    /// The numeric datatype of the measure, e.g. `http://www.w3.org/2001/XMLSchema#integer`.
    pub datatype: Option<String>,
}

impl MeasureConfig {
    pub fn new(column: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            property: property.into(),
            datatype: None,
        }
    }
}

/// Maps a column to an attribute property. Attribute values are always plain literals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeConfig {
    pub column: String,
    pub property: String,
}

impl AttributeConfig {
    pub fn new(column: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            property: property.into(),
        }
    }
}

/// The configuration of an [ObservationGenerator](super::ObservationGenerator).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub cube: String,
    /// Observation IRIs are this base followed by the key dimension values.
    pub observation_base: String,
    pub dimensions: Vec<DimensionConfig>,
    pub measures: Vec<MeasureConfig>,
    pub attributes: Vec<AttributeConfig>,
    pub date_format: String,
    /// Emit `cube:Undefined` for missing values instead of omitting the triple.
    pub emit_undefined: bool,
    /// Emit the cube, its observation set, and the links to each observation.
    pub link_observation_set: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cube: String::new(),
            observation_base: String::new(),
            dimensions: Vec::new(),
            measures: Vec::new(),
            attributes: Vec::new(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            emit_undefined: true,
            link_observation_set: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_mappings() -> Result<(), serde_json::Error> {
        let config: GeneratorConfig = serde_json::from_str(
            r#"{
                "cube": "http://example.com/cube",
                "observationBase": "http://example.com/obs/",
                "dimensions": [
                    { "column": "city", "property": "http://example.com/city", "keyDimension": true },
                    { "column": "date", "property": "http://example.com/date", "datatype": "date" }
                ],
                "measures": [{ "column": "pop", "property": "http://example.com/pop" }],
                "emitUndefined": false
            }"#,
        )?;
        assert_eq!(
            config.dimensions[0],
            DimensionConfig::new("city", "http://example.com/city").key()
        );
        assert_eq!(config.dimensions[1].datatype.as_deref(), Some("date"));
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert!(!config.emit_undefined);
        assert!(config.link_observation_set);
        assert!(config.attributes.is_empty());
        Ok(())
    }
}
