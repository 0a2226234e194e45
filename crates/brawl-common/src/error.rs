//! Error types for the Brawl combat core.

use thiserror::Error;

/// Missing or malformed geometry table data.
///
/// These are configuration errors: a fighter whose table fails validation is
/// never constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A fighter state has no animation entry
    #[error("fighter '{fighter}' has no animation for state '{state}'")]
    MissingAnimation {
        /// Fighter name
        fighter: String,
        /// State key
        state: String,
    },

    /// An animation has no frames
    #[error("fighter '{fighter}' has an empty animation for state '{state}'")]
    EmptyAnimation {
        /// Fighter name
        fighter: String,
        /// State key
        state: String,
    },

    /// An animation references a frame key that is not defined
    #[error("fighter '{fighter}' references unknown frame '{frame_key}'")]
    MissingFrame {
        /// Fighter name
        fighter: String,
        /// Frame key
        frame_key: String,
    },

    /// A frame delay value is neither a sentinel nor a positive duration
    #[error("invalid frame delay {value}")]
    InvalidFrameDelay {
        /// Raw delay value
        value: i32,
    },

    /// A box has negative extents
    #[error("fighter '{fighter}' frame '{frame_key}' has a malformed {which} box")]
    MalformedBox {
        /// Fighter name
        fighter: String,
        /// Frame key
        frame_key: String,
        /// Which box (push/hurt/hit)
        which: &'static str,
    },
}

/// Fighter asset loading errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Failed to read the asset file
    #[error("Failed to read fighter asset: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse the asset
    #[error("Failed to parse fighter asset: {0}")]
    Parse(String),

    /// The asset parsed but its geometry is invalid
    #[error("Invalid fighter asset: {0}")]
    Geometry(#[from] GeometryError),
}

/// Battle configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse the configuration
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Failed to serialize the configuration
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_converts() {
        let err: AssetError = GeometryError::InvalidFrameDelay { value: -7 }.into();
        assert!(matches!(err, AssetError::Geometry(_)));
        assert_eq!(err.to_string(), "Invalid fighter asset: invalid frame delay -7");
    }

    #[test]
    fn test_missing_frame_message() {
        let err = GeometryError::MissingFrame {
            fighter: "ryu".to_string(),
            frame_key: "forwards-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "fighter 'ryu' references unknown frame 'forwards-1'"
        );
    }
}
