//! Capability seams for the external collaborators: the form-processing
//! engine and the generation pipeline. The controller depends only on these
//! traits, so tests substitute fakes.

use std::sync::Arc;

use url::Url;

use shared::{
    domain::{Document, DocumentSource},
    error::AgentError,
    protocol::{UiEvent, XmlEvent},
};

/// Callback registered against the form document root. The session installs
/// one of these for every catalogue entry.
pub trait EventListener: Send + Sync {
    fn handle_event(&self, event: &XmlEvent);
}

/// The form-processing engine: state recalculation, validation and binding
/// evaluation live behind this seam. Calls are synchronous; the controller
/// never advances state while an engine call is in flight.
pub trait FormsProcessor: Send {
    fn init(&mut self) -> Result<(), AgentError>;

    fn shutdown(&mut self) -> Result<(), AgentError>;

    fn set_locale(&mut self, tag: &str) -> Result<(), AgentError>;

    fn set_document(&mut self, source: DocumentSource) -> Result<(), AgentError>;

    fn set_base_uri(&mut self, uri: &str);

    fn document(&self) -> Result<Document, AgentError>;

    /// Route an application-level notification into the engine, e.g. the
    /// synthesized "http-request" event carrying submitted form data.
    fn handle_ui_event(&mut self, event: &UiEvent) -> Result<(), AgentError>;

    /// Dispatch an event to the element with the given id. Returns whether
    /// the event was cancelled during dispatch.
    fn dispatch(&mut self, target: &str, event_type: &str) -> Result<bool, AgentError>;

    fn dispatch_with(
        &mut self,
        target: &str,
        event_type: &str,
        info: std::collections::HashMap<String, String>,
        bubbles: bool,
        cancelable: bool,
    ) -> Result<bool, AgentError>;

    fn add_event_listener(
        &mut self,
        event_type: &'static str,
        listener: Arc<dyn EventListener>,
        use_capture: bool,
    );

    fn remove_event_listener(&mut self, event_type: &'static str, use_capture: bool);
}

/// The external generation pipeline: parameterized once per render, then
/// invoked to serialize the document into a full response body. No streaming
/// contract; output is complete when `generate` returns.
pub trait UiGenerator: Send {
    fn set_parameter(&mut self, name: &str, value: &str);

    fn generate(&mut self, input: &Document) -> Result<Vec<u8>, AgentError>;
}

/// Creates pipeline instances for a resolved stylesheet. Injected so the
/// at-most-one-pipeline-per-session property is observable in tests.
pub trait GeneratorFactory: Send + Sync {
    fn create(&self, stylesheet: Url) -> Box<dyn UiGenerator>;
}
