//! Error types for the jigsaw_scan library

use thiserror::Error;

/// Result type alias for jigsaw_scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Error types for piece detection, matching and live guidance
#[derive(Error, Debug)]
pub enum ScanError {
    /// Contour/feature capability is missing or not initialized yet
    #[error("Capability unavailable: {capability}")]
    CapabilityUnavailable { capability: String },

    /// Transient failure inside capability-backed segmentation or matching
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// A required input (reference image, camera frame) was not supplied
    #[error("Required input unavailable: {input}")]
    InputUnavailable { input: String },

    /// Capture device could not be acquired
    #[error("Failed to acquire {resource}")]
    ResourceAcquisitionError {
        resource: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// OpenCV operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },
}

impl ScanError {
    /// Create a capability-unavailable error
    pub fn capability(capability: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            capability: capability.into(),
        }
    }

    /// Create an input-unavailable error
    pub fn input_unavailable(input: impl Into<String>) -> Self {
        Self::InputUnavailable {
            input: input.into(),
        }
    }

    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a resource acquisition error with context
    pub fn acquisition<E>(resource: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ResourceAcquisitionError {
            resource: resource.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create an OpenCV error with context
    #[cfg(feature = "opencv")]
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCvError {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Check if this error is handled by a fallback instead of being surfaced
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScanError::CapabilityUnavailable { .. } | ScanError::ProcessingError(_) => true,
            #[cfg(feature = "opencv")]
            ScanError::OpenCvError { .. } => true,
            _ => false,
        }
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            ScanError::InputUnavailable { input } => {
                format!("Please provide a {} first.", input)
            }
            ScanError::ResourceAcquisitionError { .. } => {
                "Could not access the camera. Please check permissions or upload a photo instead."
                    .to_string()
            }
            ScanError::ImageLoadError { .. } => {
                "Could not load the image. Please check the file format and try again.".to_string()
            }
            ScanError::CapabilityUnavailable { .. } => {
                "Advanced detection is not available; using simple grid detection.".to_string()
            }
            ScanError::ConfigError { .. } | ScanError::InvalidParameter { .. } => {
                "The configuration is invalid. Please check the settings file.".to_string()
            }
            _ => "Error analyzing puzzle. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ScanError::capability("contours").is_recoverable());
        assert!(ScanError::ProcessingError("boom".into()).is_recoverable());
        assert!(!ScanError::input_unavailable("reference image").is_recoverable());
        assert!(!ScanError::invalid_parameter("grid_size", 0).is_recoverable());
    }

    #[test]
    fn test_user_message_names_missing_input() {
        let err = ScanError::input_unavailable("reference image");
        assert_eq!(err.user_message(), "Please provide a reference image first.");
        assert_eq!(err.to_string(), "Required input unavailable: reference image");
    }
}
