use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Manifest not found. Looked in:\n\
        - current directory: gameflow.local.yaml, .gameflow.local.yaml, gameflow.yaml, .gameflow.yaml\n\
        - ./.gameflow/ directory\n\
        - ~/.config/gameflow/gameflow.yaml\n\
        Set GAMEFLOW_CONFIG_PATH to point at a manifest directly"
    )]
    ManifestNotFound,

    #[error("Invalid manifest {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
