use std::collections::HashMap;

use crate::domain::Document;

/// Parameter selecting the form document by URI, e.g. `form=/forms/foo.xhtml`.
pub const FORM_PARAM: &str = "form";
/// Request attribute carrying a pre-resolved form URI.
pub const FORM_URI_ATTRIBUTE: &str = "xforms.uri";
/// Parameter overriding the stylesheet used for generation.
pub const XSL_PARAM: &str = "xslt";
/// Parameter overriding the action URL emitted into the generated page.
pub const ACTION_URL_PARAM: &str = "action_url";
/// Per-request language selector; wins over every other locale source.
pub const LANG_PARAM: &str = "lang";
/// Parameter requesting debug output; only honored when configuration allows.
pub const DEBUG_PARAM: &str = "debug";
/// Parameter naming the client-agent class.
pub const USERAGENT_PARAM: &str = "useragent";

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// An inbound exchange, already lifted out of the transport layer.
///
/// Cookie and header copying, multipart decoding and friends happen before
/// one of these is built; the agent only sees resolved values.
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
    /// HTTP method of the exchange; POST classifies as an update.
    pub method: String,
    /// Context root the application is mounted under, e.g. `/forms-app`.
    pub context_path: String,
    /// Path of the handling endpoint below the context root.
    pub servlet_path: String,
    /// Full request URI as the client sent it.
    pub request_uri: String,
    pub query_string: Option<String>,
    /// Named request parameters (query string and form fields).
    pub params: HashMap<String, String>,
    /// Request-scoped attributes set by upstream handlers.
    pub attributes: HashMap<String, String>,
    /// Raw `Accept-Language` header, if the client sent one.
    pub accept_language: Option<String>,
    /// Input document attached as an already-built node.
    pub document_node: Option<Document>,
    /// Input document attached as a byte stream.
    pub document_stream: Option<Vec<u8>>,
    /// Input document attached as pre-parsed source text.
    pub document_text: Option<String>,
}

impl FormRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// What the agent wants sent back to the client. The transport layer turns
/// this into an actual HTTP response with cache-disabling headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebResponse {
    /// Redirect to the given location.
    Redirect { location: String },
    /// A fully rendered body; content length is measured before writing.
    Rendered {
        content_type: &'static str,
        body: Vec<u8>,
    },
    /// An exit condition was acknowledged but produced no visible
    /// navigation (a load-uri exit without a `show` flag). The exchange is
    /// left unresolved on purpose; see the exit handler.
    Unresolved,
}

/// An application-level notification routed from the transport layer into
/// the engine, such as the synthesized "http-request" submission event.
#[derive(Debug, Clone)]
pub struct UiEvent {
    pub name: String,
    pub target: Option<String>,
    pub params: HashMap<String, String>,
}

impl UiEvent {
    pub fn new(name: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            params,
        }
    }
}

/// A notification event observed on the form document root.
#[derive(Debug, Clone)]
pub struct XmlEvent {
    pub event_type: String,
    pub target: String,
    pub context: HashMap<String, String>,
}

impl XmlEvent {
    pub fn new(event_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            target: target.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(name.into(), value.into());
        self
    }

    pub fn context_info(&self, name: &str) -> Option<&str> {
        self.context.get(name).map(String::as_str)
    }
}
