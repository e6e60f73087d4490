use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Opaque handle to the form document owned by the processing engine.
///
/// The agent never inspects document contents; it only threads the handle
/// between the engine and the generation pipeline.
#[derive(Debug, Clone)]
pub struct Document(Arc<str>);

impl Document {
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Document {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for Document {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

/// The ways an input document can be handed to the engine. Exactly one must
/// be present on an initialization exchange.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A URI pointing at the form, resolved by the engine.
    Uri(String),
    /// An already-built document node attached to the exchange.
    Node(Document),
    /// Raw bytes of a serialized document.
    Stream(Vec<u8>),
    /// Pre-parsed source text.
    Text(String),
}

/// The client-agent classes the generation pipeline knows how to target.
/// Anything else is a configuration error, never silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiAgent {
    Dojo,
    Html,
}

impl FromStr for UiAgent {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "dojo" | "dojodev" => Ok(Self::Dojo),
            "html" => Ok(Self::Html),
            other => Err(AgentError::Config(format!("invalid useragent: '{other}'"))),
        }
    }
}

impl fmt::Display for UiAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dojo => write!(f, "dojo"),
            Self::Html => write!(f, "html"),
        }
    }
}
