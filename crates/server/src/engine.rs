//! Built-in engine and generator used when the binary runs standalone.
//! Real deployments inject their own implementations of the processor and
//! generator seams; these exist so the agent is runnable end to end.

use std::{collections::HashMap, sync::Arc};

use tracing::debug;
use url::Url;

use shared::{
    domain::{Document, DocumentSource},
    error::AgentError,
    events,
    protocol::{UiEvent, XmlEvent},
};
use web_agent::{EventListener, FormsProcessor, GeneratorFactory, UiGenerator};

/// Holds the form document in memory and notifies listeners of the model
/// lifecycle. Performs no recalculation or validation.
#[derive(Default)]
pub struct InMemoryProcessor {
    document: Option<Document>,
    base_uri: Option<String>,
    locale: String,
    listeners: Vec<(&'static str, Arc<dyn EventListener>, bool)>,
}

impl InMemoryProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn fire(&self, event_type: &str) {
        let event = XmlEvent::new(event_type, "#document");
        for (name, listener, _) in &self.listeners {
            if *name == event_type {
                listener.handle_event(&event);
            }
        }
    }
}

impl FormsProcessor for InMemoryProcessor {
    fn init(&mut self) -> Result<(), AgentError> {
        if self.document.is_none() {
            return Err(AgentError::engine("init without a document"));
        }
        self.fire(events::MODEL_CONSTRUCT);
        self.fire(events::MODEL_CONSTRUCT_DONE);
        self.fire(events::READY);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), AgentError> {
        self.document = None;
        Ok(())
    }

    fn set_locale(&mut self, tag: &str) -> Result<(), AgentError> {
        self.locale = tag.to_string();
        Ok(())
    }

    fn set_document(&mut self, source: DocumentSource) -> Result<(), AgentError> {
        self.document = Some(match source {
            DocumentSource::Uri(uri) => Document::from(format!("<form src=\"{uri}\"/>")),
            DocumentSource::Node(node) => node,
            DocumentSource::Stream(bytes) => Document::from(
                String::from_utf8(bytes)
                    .map_err(|_| AgentError::engine("document stream is not valid UTF-8"))?,
            ),
            DocumentSource::Text(text) => Document::from(text),
        });
        Ok(())
    }

    fn set_base_uri(&mut self, uri: &str) {
        self.base_uri = Some(uri.to_string());
    }

    fn document(&self) -> Result<Document, AgentError> {
        self.document
            .clone()
            .ok_or_else(|| AgentError::engine("no document loaded"))
    }

    fn handle_ui_event(&mut self, event: &UiEvent) -> Result<(), AgentError> {
        debug!(event = %event.name, "ui event received");
        Ok(())
    }

    fn dispatch(&mut self, target: &str, event_type: &str) -> Result<bool, AgentError> {
        debug!(target, event_type, "dispatch");
        self.fire(event_type);
        Ok(false)
    }

    fn dispatch_with(
        &mut self,
        target: &str,
        event_type: &str,
        _info: HashMap<String, String>,
        _bubbles: bool,
        _cancelable: bool,
    ) -> Result<bool, AgentError> {
        self.dispatch(target, event_type)
    }

    fn add_event_listener(
        &mut self,
        event_type: &'static str,
        listener: Arc<dyn EventListener>,
        use_capture: bool,
    ) {
        self.listeners.push((event_type, listener, use_capture));
    }

    fn remove_event_listener(&mut self, event_type: &'static str, use_capture: bool) {
        self.listeners
            .retain(|(name, _, capture)| !(*name == event_type && *capture == use_capture));
    }
}

/// Wraps the document into a minimal HTML page carrying the generation
/// parameters, standing in for the stylesheet pipeline.
pub struct HtmlGenerator {
    stylesheet: Url,
    parameters: Vec<(String, String)>,
}

impl UiGenerator for HtmlGenerator {
    fn set_parameter(&mut self, name: &str, value: &str) {
        self.parameters.push((name.to_string(), value.to_string()));
    }

    fn generate(&mut self, input: &Document) -> Result<Vec<u8>, AgentError> {
        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html><body>\n");
        page.push_str(input.as_str());
        page.push('\n');
        for (name, value) in &self.parameters {
            page.push_str(&format!("<!-- {name}={value} -->\n"));
        }
        page.push_str(&format!("<!-- stylesheet={} -->\n", self.stylesheet));
        page.push_str("</body></html>\n");
        Ok(page.into_bytes())
    }
}

pub struct HtmlGeneratorFactory;

impl GeneratorFactory for HtmlGeneratorFactory {
    fn create(&self, stylesheet: Url) -> Box<dyn UiGenerator> {
        Box::new(HtmlGenerator {
            stylesheet,
            parameters: Vec::new(),
        })
    }
}
