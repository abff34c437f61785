use thiserror::Error;

/// Startup and infrastructure failures.
///
/// Request-level errors are modelled by each service; this type only covers
/// what can go wrong before the server starts accepting requests.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_internal() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(matches!(err, AppError::InternalError(_)));
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn test_config_error_keeps_message() {
        let err: AppError = config::ConfigError::Message("bad port".into()).into();
        assert_eq!(err.to_string(), "Configuration error: bad port");
    }
}
