use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("source '{source_name}' is missing required field '{field}'")]
    MissingField {
        source_name: &'static str,
        field: &'static str,
    },

    #[error("source '{source_name}': field '{field}' has invalid value '{value}'")]
    InvalidField {
        source_name: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("registry name '{0}' does not split into family and given parts")]
    MalformedRegistryName(String),

    #[error("source contains unknown entity reference '&{0};'")]
    UnknownEntity(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
