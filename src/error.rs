// error.rs
use thiserror::Error;

/// Errors returned by the fallible renderer entry points.
///
/// Frame-time code never surfaces these; it logs and keeps drawing.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("shader not found: {name:?}")]
    ShaderNotFound { name: String },

    #[error("material {id} does not exist")]
    MaterialNotFound { id: u32 },

    #[error("render object {id} does not exist")]
    RenderObjectNotFound { id: u32 },

    #[error("texture size {width}x{height} exceeds the maximum dimension of {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("backend error while {context}: {message}")]
    Backend { context: String, message: String },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Errors raised while reading or writing the renderer settings files.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid vector string {0:?}, expected \"x, y, z\"")]
    InvalidVector(String),

    #[error("no renderer settings found at {path:?} or the default location")]
    MissingFile { path: std::path::PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RenderError::ShaderNotFound {
            name: "pbr2".to_string(),
        };
        assert_eq!(err.to_string(), "shader not found: \"pbr2\"");

        let err = RenderError::TextureTooLarge {
            width: 70000,
            height: 16,
            max: 16384,
        };
        assert_eq!(
            err.to_string(),
            "texture size 70000x16 exceeds the maximum dimension of 16384"
        );
    }

    #[test]
    fn settings_error_converts_into_render_error() {
        let err: RenderError = SettingsError::InvalidVector("1,2".to_string()).into();
        assert!(matches!(err, RenderError::Settings(SettingsError::InvalidVector(_))));
    }
}
