use std::fmt;

#[derive(Debug)]
pub enum RoamError {
    Api { status: u16, message: String },
    Http(reqwest::Error),
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    TomlSer(toml::ser::Error),
    /// A host-side editor call (focus, navigation, sidebar) was rejected.
    Host(String),
}

impl fmt::Display for RoamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Config(msg) => write!(f, "Config error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::TomlSer(e) => write!(f, "TOML write error: {}", e),
            Self::Host(msg) => write!(f, "Host error: {}", msg),
        }
    }
}

impl std::error::Error for RoamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::TomlSer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RoamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<std::io::Error> for RoamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for RoamError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<toml::ser::Error> for RoamError {
    fn from(e: toml::ser::Error) -> Self {
        Self::TomlSer(e)
    }
}

pub type Result<T> = std::result::Result<T, RoamError>;

/// Structured error data for the message channel
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorInfo {
    Api { status: u16, body: String },
    Network(String),
    Write(String),
    Strategy { algorithm: String, message: String },
}

impl ErrorInfo {
    pub fn from_roam_error(e: &RoamError) -> Self {
        match e {
            RoamError::Api { status, message } => ErrorInfo::Api {
                status: *status,
                body: message.clone(),
            },
            RoamError::Host(msg) => ErrorInfo::Write(msg.clone()),
            _ => ErrorInfo::Network(e.to_string()),
        }
    }
}

/// Ready-to-render error popup data
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPopup {
    pub title: String,
    pub message: String,
    pub hint: String,
}

impl ErrorPopup {
    pub fn from_error_info(info: &ErrorInfo) -> Self {
        match info {
            ErrorInfo::Api { status, body } => Self::from_api(*status, body),
            ErrorInfo::Network(msg) => Self {
                title: "Network Error".into(),
                message: truncate(msg, 80),
                hint: "Check your internet connection".into(),
            },
            ErrorInfo::Write(msg) => Self {
                title: "Action Failed".into(),
                message: truncate(msg, 80),
                hint: "The block was not changed, try again".into(),
            },
            ErrorInfo::Strategy { algorithm, message } => Self {
                title: format!("{} Algorithm Failed", algorithm),
                message: truncate(message, 200),
                hint: "Fix the algorithm in config.toml".into(),
            },
        }
    }

    fn from_api(status: u16, body: &str) -> Self {
        let extracted_message = extract_json_message(body);

        match status {
            429 => Self {
                title: "Rate Limited".into(),
                message: extracted_message.unwrap_or_else(|| "Too many requests".into()),
                hint: "Wait a moment and try again".into(),
            },
            401 => Self {
                title: "Unauthorized".into(),
                message: "Invalid API token".into(),
                hint: "Check your config.toml".into(),
            },
            403 => Self {
                title: "Forbidden".into(),
                message: "Access denied to this graph".into(),
                hint: "Check graph permissions".into(),
            },
            500 => Self {
                title: "Server Error".into(),
                message: "Roam servers returned an error".into(),
                hint: "Try again later".into(),
            },
            _ => Self {
                title: format!("API Error ({})", status),
                message: extracted_message.unwrap_or_else(|| truncate(body, 200)),
                hint: "Try again later".into(),
            },
        }
    }
}

fn extract_json_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(String::from))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
