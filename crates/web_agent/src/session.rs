//! The per-session lifecycle controller: configure, init, handle one
//! exchange at a time, shut down.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use shared::{
    domain::{Document, DocumentSource, UiAgent},
    error::AgentError,
    events,
    protocol::{
        FormRequest, UiEvent, WebResponse, FORM_PARAM, FORM_URI_ATTRIBUTE, HTML_CONTENT_TYPE,
        USERAGENT_PARAM,
    },
};

use crate::{
    classify::{classify, Exchange},
    config::Settings,
    exit::{self, ExitKind, ExitListener, ExitSlot},
    generator, locale,
    processor::{EventListener, FormsProcessor, GeneratorFactory, UiGenerator},
    registry::{SessionHandle, SessionRegistry},
};

/// Lifecycle phases. `Handling` is not a stored phase; it is the span of
/// one `handle_request` call, bounded by the per-key mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Configured,
    Initialized,
    ShutDown,
}

/// One server-side form session: exactly one engine instance, one exit
/// slot, at most one generation pipeline, owned by exactly one registry key.
pub struct FormSession {
    key: String,
    phase: Phase,
    engine: Box<dyn FormsProcessor>,
    factory: Arc<dyn GeneratorFactory>,
    settings: Arc<Settings>,
    registry: Arc<SessionRegistry>,
    exit: Arc<ExitSlot>,
    generator: Option<Box<dyn UiGenerator>>,
    agent: UiAgent,
    locale: String,
    upload_destination: Option<PathBuf>,
    referer: Option<String>,
    attached: bool,
    touched_at: Option<DateTime<Utc>>,
}

impl FormSession {
    pub fn new(
        engine: Box<dyn FormsProcessor>,
        factory: Arc<dyn GeneratorFactory>,
        settings: Arc<Settings>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            key: Uuid::new_v4().simple().to_string(),
            phase: Phase::Created,
            engine,
            factory,
            settings,
            registry,
            exit: Arc::new(ExitSlot::default()),
            generator: None,
            agent: UiAgent::Html,
            locale: locale::FALLBACK_LOCALE.to_string(),
            upload_destination: None,
            referer: None,
            attached: false,
            touched_at: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The identifier this session is registered under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn upload_destination(&self) -> Option<&Path> {
        self.upload_destination.as_deref()
    }

    pub fn touched_at(&self) -> Option<DateTime<Utc>> {
        self.touched_at
    }

    /// Apply resolved configuration to this session: client-agent class,
    /// locale policy and upload destination.
    pub fn configure(&mut self, request: &FormRequest) -> Result<(), AgentError> {
        self.agent = request
            .param(USERAGENT_PARAM)
            .unwrap_or(self.settings.useragent.as_str())
            .parse()?;
        self.locale = locale::resolve_locale(request, &self.settings);
        self.engine.set_locale(&self.locale)?;
        self.upload_destination = Some(
            self.settings
                .upload_destination()
                .ok_or_else(|| AgentError::config("upload dir is not set"))?,
        );
        self.phase = Phase::Configured;
        Ok(())
    }

    /// Pass the input document to the engine. Exactly one source must be
    /// present on the exchange: a `form` URI parameter, a URI attribute, an
    /// attached node, a byte stream, or pre-parsed text.
    pub fn set_form(&mut self, request: &FormRequest) -> Result<(), AgentError> {
        if let Some(uri) = request.param(FORM_PARAM) {
            let uri = uri.to_string();
            self.engine.set_document(DocumentSource::Uri(uri.clone()))?;
            // the base URI must match the path of the loaded form
            self.engine.set_base_uri(&uri);
        } else if let Some(uri) = request.attribute(FORM_URI_ATTRIBUTE) {
            self.engine.set_document(DocumentSource::Uri(uri.to_string()))?;
        } else if let Some(node) = &request.document_node {
            self.engine.set_document(DocumentSource::Node(node.clone()))?;
        } else if let Some(stream) = &request.document_stream {
            self.engine
                .set_document(DocumentSource::Stream(stream.clone()))?;
        } else if let Some(text) = &request.document_text {
            self.engine.set_document(DocumentSource::Text(text.clone()))?;
        } else {
            return Err(AgentError::MissingDocument);
        }
        Ok(())
    }

    /// Attach the listener catalogue, then initialize the engine.
    /// Interaction events may fire during engine init, so registration has
    /// to happen first or early events are silently lost.
    pub fn init(&mut self) -> Result<(), AgentError> {
        if self.phase != Phase::Configured {
            return Err(AgentError::config(
                "transport context missing; session must be configured before init",
            ));
        }
        self.attach_listeners();
        self.engine.init()?;
        self.phase = Phase::Initialized;
        Ok(())
    }

    /// Process one exchange. Callers must hold the per-key mutex (see
    /// [`drive`]); `self_handle` is the registry entry this session inserts
    /// for itself on the initialization path.
    pub async fn handle_request(
        &mut self,
        request: &FormRequest,
        self_handle: &SessionHandle,
    ) -> Result<WebResponse, AgentError> {
        if self.phase != Phase::Initialized {
            return Err(AgentError::config("session is not initialized"));
        }

        let updating = classify(request) == Exchange::Update;
        if updating {
            let event = UiEvent::new("http-request", request.params.clone());
            debug!(event = %event.name, session_key = %self.key, "routing ui event to engine");
            self.engine.handle_ui_event(&event)?;
        }

        if let Some(exit_event) = self.exit.take() {
            let kind = exit_event.kind;
            let response =
                exit::handle_exit(exit_event, &self.key, &request.context_path, &self.registry)
                    .await?;
            if kind == ExitKind::LoadUri && matches!(response, WebResponse::Redirect { .. }) {
                self.shutdown();
            }
            return Ok(response);
        }

        if updating {
            // an update never renders; re-issue the exchange as an init
            // against the view endpoint so a refresh does not re-submit
            let referer = self.referer.clone().unwrap_or_default();
            let location = format!(
                "{}/view?sessionKey={}&referer={}",
                request.context_path, self.key, referer
            );
            return Ok(WebResponse::Redirect { location });
        }

        self.referer = Some(format!(
            "{}{}?{}",
            request.context_path,
            request.servlet_path,
            request.query_string.clone().unwrap_or_default()
        ));
        if self.generator.is_none() {
            self.generator = Some(generator::create_generator(
                &self.settings,
                request,
                self.agent,
                &self.key,
                self.factory.as_ref(),
            )?);
        }
        self.registry
            .put(self.key.clone(), Arc::clone(self_handle))
            .await;
        self.touched_at = Some(Utc::now());

        let document = self.engine.document()?;
        let ui_generator = self
            .generator
            .as_mut()
            .ok_or_else(|| AgentError::config("generator missing after creation"))?;
        let body = ui_generator.generate(&document)?;
        debug!(bytes = body.len(), session_key = %self.key, "rendered response body");
        Ok(WebResponse::Rendered {
            content_type: HTML_CONTENT_TYPE,
            body,
        })
    }

    /// Close the session because of a fatal error: tear down, retain the
    /// error for the error page, evict the key and redirect.
    pub async fn close(&mut self, cause: &AgentError) -> WebResponse {
        error!(session_key = %self.key, %cause, "closing session");
        self.shutdown();
        self.registry
            .store_error(self.key.clone(), cause.to_string())
            .await;
        self.registry.remove(&self.key).await;
        WebResponse::Redirect {
            location: format!(
                "{}/{}?sessionKey={}",
                self.settings.context_path, self.settings.error_page, self.key
            ),
        }
    }

    /// Terminate form processing. Engine shutdown is best-effort and never
    /// aborts teardown; listener detachment mirrors attachment exactly.
    /// Repeated calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.phase == Phase::ShutDown {
            return;
        }
        if let Err(shutdown_error) = self.engine.shutdown() {
            error!(session_key = %self.key, %shutdown_error, "engine shutdown failed");
        }
        self.detach_listeners();
        self.phase = Phase::ShutDown;
    }

    fn attach_listeners(&mut self) {
        let listener: Arc<dyn EventListener> =
            Arc::new(ExitListener::new(Arc::clone(&self.exit)));
        for &(event_type, use_capture) in events::LISTENER_CATALOGUE {
            self.engine
                .add_event_listener(event_type, Arc::clone(&listener), use_capture);
        }
        self.attached = true;
    }

    fn detach_listeners(&mut self) {
        if !self.attached {
            return;
        }
        for &(event_type, use_capture) in events::LISTENER_CATALOGUE {
            self.engine.remove_event_listener(event_type, use_capture);
        }
        self.attached = false;
    }

    // pass-through delegation to the engine

    pub fn dispatch(&mut self, target: &str, event_type: &str) -> Result<bool, AgentError> {
        self.engine.dispatch(target, event_type)
    }

    pub fn dispatch_with(
        &mut self,
        target: &str,
        event_type: &str,
        info: HashMap<String, String>,
        bubbles: bool,
        cancelable: bool,
    ) -> Result<bool, AgentError> {
        self.engine
            .dispatch_with(target, event_type, info, bubbles, cancelable)
    }

    pub fn document(&self) -> Result<Document, AgentError> {
        self.engine.document()
    }

    pub fn set_document(&mut self, source: DocumentSource) -> Result<(), AgentError> {
        self.engine.set_document(source)
    }

    pub fn set_locale(&mut self, tag: &str) -> Result<(), AgentError> {
        self.locale = tag.to_string();
        self.engine.set_locale(tag)
    }
}

/// Run one exchange against a session handle. Locking the handle is what
/// keeps exchanges for the same key mutually exclusive; different keys lock
/// independent sessions and proceed in parallel.
pub async fn drive(
    handle: &SessionHandle,
    request: &FormRequest,
) -> Result<WebResponse, AgentError> {
    let mut session = handle.lock().await;
    session.handle_request(request, handle).await
}
