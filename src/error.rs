use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Errors raised while loading a scenario document.
///
/// Every variant is fatal: the document is rejected as a whole and no partial
/// scenario is handed out.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A node carries a variant tag outside its closed set (or none at all).
    #[error("{location}: {} for {extension_point}, expected one of: {}", tag_phrase(.tag), .expected.join(", "))]
    Schema {
        location: String,
        extension_point: &'static str,
        tag: String,
        expected: &'static [&'static str],
    },

    #[error("{location}: unknown field `{field}`, expected one of: {}", .expected.join(", "))]
    UnknownField {
        location: String,
        field: String,
        expected: Vec<String>,
    },

    #[error("{location}: missing required field `{field}`")]
    MissingField { location: String, field: String },

    #[error("{location}: expected {expected}, found {found}")]
    TypeMismatch {
        location: String,
        expected: String,
        found: String,
    },

    #[error("{location}: unresolved {kind} reference `{alias}`")]
    UnresolvedReference {
        location: String,
        kind: &'static str,
        alias: String,
    },

    #[error("alias `{alias}` declared twice ({first} and {second})")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("YAML error: {0}")]
    AnchorScan(#[from] yaml_rust2::scanner::ScanError),

    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn tag_phrase(tag: &str) -> String {
    if tag.is_empty() {
        "missing variant tag".to_string()
    } else {
        format!("unknown variant tag `!{tag}`")
    }
}

impl ScenarioError {
    pub(crate) fn mismatch(
        location: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            location: location.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Document location the error points at, when it has one.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Schema { location, .. }
            | Self::UnknownField { location, .. }
            | Self::MissingField { location, .. }
            | Self::TypeMismatch { location, .. }
            | Self::UnresolvedReference { location, .. } => Some(location),
            Self::DuplicateAlias { second, .. } => Some(second),
            Self::Yaml(_) | Self::AnchorScan(_) | Self::Io { .. } => None,
        }
    }
}
