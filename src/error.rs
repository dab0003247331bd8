#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid dataset: {0}")]
    MalformedDataset(String),

    #[error("Could not load any dataset for source '{0}'")]
    DatasetUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
