//! Per-session request-lifecycle controller for server-side form sessions.
//!
//! A session binds one client form instance to one engine instance. Inbound
//! exchanges are classified as initialization or update, exit conditions
//! raised by the engine terminate the session with a redirect, and anything
//! else drives the generation pipeline to re-emit the UI.

pub mod classify;
pub mod config;
pub mod exit;
pub mod generator;
pub mod locale;
pub mod processor;
pub mod registry;
pub mod session;

pub use classify::{classify, Exchange};
pub use config::{load_settings, Settings};
pub use exit::{ExitEvent, ExitKind, ExitSlot};
pub use processor::{EventListener, FormsProcessor, GeneratorFactory, UiGenerator};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{drive, FormSession};
