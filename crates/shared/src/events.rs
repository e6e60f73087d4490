//! The closed set of lifecycle and interaction event names a form session
//! listens for, plus the capture flags used when registering for them.

// DOM notification events
pub const ACTIVATE: &str = "DOMActivate";
pub const FOCUS_IN: &str = "DOMFocusIn";
pub const FOCUS_OUT: &str = "DOMFocusOut";

// form lifecycle and interaction events
pub const BINDING_EXCEPTION: &str = "xforms-binding-exception";
pub const COMPUTE_EXCEPTION: &str = "xforms-compute-exception";
pub const FOCUS: &str = "xforms-focus";
pub const HELP: &str = "xforms-help";
pub const HINT: &str = "xforms-hint";
pub const INVALID: &str = "xforms-invalid";
pub const IN_RANGE: &str = "xforms-in-range";
pub const OUT_OF_RANGE: &str = "xforms-out-of-range";
pub const LOAD_URI: &str = "betterform-load-uri";
pub const LINK_EXCEPTION: &str = "xforms-link-exception";
pub const LINK_ERROR: &str = "xforms-link-error";
pub const MODEL_CONSTRUCT: &str = "xforms-model-construct";
pub const MODEL_CONSTRUCT_DONE: &str = "xforms-model-construct-done";
pub const NEXT: &str = "xforms-next";
pub const PREVIOUS: &str = "xforms-previous";
pub const READY: &str = "xforms-ready";
pub const RENDER_MESSAGE: &str = "betterform-render-message";
pub const REPLACE_ALL: &str = "betterform-replace-all";
pub const SUBMIT: &str = "xforms-submit";
pub const SUBMIT_DONE: &str = "xforms-submit-done";
pub const SUBMIT_ERROR: &str = "xforms-submit-error";
pub const VALUE_CHANGED: &str = "xforms-value-changed";
pub const VERSION_EXCEPTION: &str = "xforms-version-exception";
pub const VALID: &str = "xforms-valid";
pub const SELECT: &str = "xforms-select";
pub const DESELECT: &str = "xforms-deselect";

/// Every event a session registers for, paired with its capture flag.
///
/// Attach and detach both iterate this table, so the registered and
/// deregistered sets cannot drift apart. `xforms-focus` is the one entry
/// observed in the bubble phase.
pub const LISTENER_CATALOGUE: &[(&str, bool)] = &[
    (ACTIVATE, true),
    (BINDING_EXCEPTION, true),
    (COMPUTE_EXCEPTION, true),
    (FOCUS, false),
    (FOCUS_IN, true),
    (FOCUS_OUT, true),
    (HELP, true),
    (HINT, true),
    (INVALID, true),
    (IN_RANGE, true),
    (OUT_OF_RANGE, true),
    (LOAD_URI, true),
    (LINK_EXCEPTION, true),
    (LINK_ERROR, true),
    (MODEL_CONSTRUCT, true),
    (MODEL_CONSTRUCT_DONE, true),
    (NEXT, true),
    (PREVIOUS, true),
    (READY, true),
    (RENDER_MESSAGE, true),
    (REPLACE_ALL, true),
    (SUBMIT, true),
    (SUBMIT_DONE, true),
    (SUBMIT_ERROR, true),
    (VERSION_EXCEPTION, true),
    (VALUE_CHANGED, true),
    (VALID, true),
    (SELECT, true),
    (DESELECT, true),
];
