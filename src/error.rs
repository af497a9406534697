use thiserror::Error;

#[derive(Error, Debug)]
pub enum FertiplanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid bin definition '{raw}': '{token}' is not a number")]
    InvalidBin { raw: String, token: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, FertiplanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bin_display_names_token() {
        let err = FertiplanError::InvalidBin {
            raw: "a-5".to_string(),
            token: "a".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid bin definition 'a-5': 'a' is not a number"
        );
    }
}
