//! Exit-condition handling: a terminal signal raised by the engine ends the
//! session in a redirect instead of a render.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use shared::{
    error::AgentError,
    events,
    protocol::{WebResponse, XmlEvent},
};

use crate::{processor::EventListener, registry::SessionRegistry};

/// The two exit conditions: a submission with full replacement, or an
/// explicit navigation raised by a load action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    ReplaceAll,
    LoadUri,
}

#[derive(Debug, Clone)]
pub struct ExitEvent {
    pub kind: ExitKind,
    pub context: HashMap<String, String>,
}

impl ExitEvent {
    pub fn new(kind: ExitKind, context: HashMap<String, String>) -> Self {
        Self { kind, context }
    }

    pub fn context_info(&self, name: &str) -> Option<&str> {
        self.context.get(name).map(String::as_str)
    }
}

/// Single-slot mailbox the engine writes to (through the registered
/// listeners) and the controller reads exactly once per exchange. The first
/// write wins; later writes are dropped.
#[derive(Debug, Default)]
pub struct ExitSlot {
    inner: Mutex<Option<ExitEvent>>,
}

impl ExitSlot {
    pub fn set(&self, event: ExitEvent) {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(event);
        } else {
            debug!(kind = ?event.kind, "exit event already pending; keeping the first");
        }
    }

    pub fn take(&self) -> Option<ExitEvent> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// The listener the session registers for every catalogue entry. Exit
/// conditions feed the slot; everything else is logged and ignored.
pub struct ExitListener {
    slot: Arc<ExitSlot>,
}

impl ExitListener {
    pub fn new(slot: Arc<ExitSlot>) -> Self {
        Self { slot }
    }
}

impl EventListener for ExitListener {
    fn handle_event(&self, event: &XmlEvent) {
        match event.event_type.as_str() {
            events::REPLACE_ALL => self
                .slot
                .set(ExitEvent::new(ExitKind::ReplaceAll, event.context.clone())),
            events::LOAD_URI => self
                .slot
                .set(ExitEvent::new(ExitKind::LoadUri, event.context.clone())),
            other => debug!(event = other, target = %event.target, "event observed"),
        }
    }
}

/// Handle a consumed exit event.
///
/// Replace-all redirects to the submission-response endpoint and leaves the
/// session registered so the submission result can be resolved under the
/// same key. Load-uri with a `show` flag evicts the session first, then
/// redirects; without the flag nothing visible happens and the exchange is
/// left unresolved (the original fell through here too, so this is kept
/// rather than fixed).
pub async fn handle_exit(
    exit: ExitEvent,
    session_key: &str,
    context_path: &str,
    registry: &SessionRegistry,
) -> Result<WebResponse, AgentError> {
    match exit.kind {
        ExitKind::ReplaceAll => Ok(WebResponse::Redirect {
            location: format!("{context_path}/SubmissionResponse?sessionKey={session_key}"),
        }),
        ExitKind::LoadUri => {
            if exit.context_info("show").is_none() {
                warn!(session_key, "load-uri exit without 'show'; exchange left unresolved");
                return Ok(WebResponse::Unresolved);
            }
            let uri = exit
                .context_info("uri")
                .map(str::to_string)
                .ok_or_else(|| AgentError::config("load-uri exit event carries no uri"))?;

            // Eviction must be visible before the redirect exists, so a
            // concurrent lookup under this key resolves to "not found".
            registry.remove(session_key).await;
            debug!(session_key, uri, "loading exit target");
            Ok(WebResponse::Redirect { location: uri })
        }
    }
}
