use std::fmt;

#[derive(Debug)]
pub enum HarmonicsError {
    UnsupportedChannelCount { channels: usize },
    InvalidSampleRate { sample_rate: f64 },
    UnknownParameter { id: String },
    NotPrepared,
    State(serde_json::Error),
}

impl fmt::Display for HarmonicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonicsError::UnsupportedChannelCount { channels } => {
                write!(f, "Unsupported channel count {channels}, expected mono or stereo")
            }
            HarmonicsError::InvalidSampleRate { sample_rate } => {
                write!(f, "Invalid sample rate {sample_rate}")
            }
            HarmonicsError::UnknownParameter { id } => write!(f, "Unknown parameter '{id}'"),
            HarmonicsError::NotPrepared => write!(f, "Processor used before prepare_to_play"),
            HarmonicsError::State(e) => write!(f, "State error: {e}"),
        }
    }
}

impl std::error::Error for HarmonicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarmonicsError::State(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for HarmonicsError {
    fn from(e: serde_json::Error) -> Self {
        HarmonicsError::State(e)
    }
}
