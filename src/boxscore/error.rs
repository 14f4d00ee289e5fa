use std::fmt;

/// Why an extraction did not produce a stats record.
///
/// Every variant is recoverable by the caller: show the message and let the
/// user retry with a clearer screenshot or a corrected username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The OCR engine failed or recognized nothing.
    OcrUnavailable { reason: String },
    /// No line or word contains the requested identifier.
    PlayerNotFound { identifier: String },
    /// The located row has fewer fields than a full stat line.
    IncompleteRow { found: usize, required: usize },
    /// A numeric column holds something that is not a number.
    MalformedField { field: &'static str, value: String },
    /// The remote parser answered with a non-success status.
    Remote { status: u16, detail: String },
    /// The remote parser could not be reached.
    Network(String),
}

impl ExtractError {
    /// Stable lowercase tag, used in logs and the batch summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OcrUnavailable { .. } => "ocr_unavailable",
            Self::PlayerNotFound { .. } => "player_not_found",
            Self::IncompleteRow { .. } => "incomplete_row",
            Self::MalformedField { .. } => "malformed_field",
            Self::Remote { .. } => "remote",
            Self::Network(_) => "network",
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OcrUnavailable { reason } => write!(f, "OCR unavailable: {}", reason),
            Self::PlayerNotFound { identifier } => {
                write!(f, "Player '{}' not found in image", identifier)
            }
            Self::IncompleteRow { found, required } => write!(
                f,
                "Incomplete stats row: found {} fields, need {}",
                found, required
            ),
            Self::MalformedField { field, value } => {
                write!(f, "Malformed value for {}: '{}'", field, value)
            }
            Self::Remote { status, detail } => {
                write!(f, "Remote parser rejected request (HTTP {}): {}", status, detail)
            }
            Self::Network(msg) => write!(f, "Could not reach remote parser: {}", msg),
        }
    }
}

impl std::error::Error for ExtractError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ExtractError::PlayerNotFound {
            identifier: "NOBODY".to_string(),
        };
        assert_eq!(err.to_string(), "Player 'NOBODY' not found in image");

        let err = ExtractError::IncompleteRow { found: 7, required: 12 };
        assert_eq!(err.to_string(), "Incomplete stats row: found 7 fields, need 12");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(
            ExtractError::OcrUnavailable { reason: "x".into() }.kind(),
            "ocr_unavailable"
        );
        assert_eq!(ExtractError::Network("refused".into()).kind(), "network");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = ExtractError::MalformedField {
            field: "points",
            value: "2A".into(),
        }
        .into();
        assert!(err.to_string().contains("points"));
        assert!(err.downcast_ref::<ExtractError>().is_some());
    }
}
