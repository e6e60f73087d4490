use std::{env, fs, path::PathBuf};

use serde::Deserialize;

use shared::domain::UiAgent;

pub const SELECTOR_PREFIX_DEFAULT: &str = "s_";
pub const REMOVE_UPLOAD_PREFIX_DEFAULT: &str = "ru_";
pub const DATA_PREFIX_DEFAULT: &str = "d_";
pub const TRIGGER_PREFIX_DEFAULT: &str = "t_";

/// Resolved agent configuration. Loaded once at startup; sessions hold a
/// shared handle and never mutate it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_bind: String,
    /// Context root used for redirects issued outside a request scope.
    pub context_path: String,
    /// Absolute public URL of this server, used for agent classes that need
    /// an absolute action URL.
    pub public_url: Option<String>,
    /// Base URL the stylesheet identifiers are resolved against.
    pub stylesheet_path: String,
    /// Default stylesheet per client-agent class.
    pub stylesheet_html: String,
    pub stylesheet_dojo: String,
    /// Emit `.` as the context root so generated pages use relative URIs.
    pub relative_uris: bool,
    /// Destination for uploaded files. Empty is a configuration error.
    pub upload_dir: String,
    /// Page a closed session redirects to, below the context root.
    pub error_page: String,
    /// Configured language; empty means unset.
    pub preselect_language: String,
    pub enable_l10n: bool,
    /// Whether the `debug` request parameter is honored at all.
    pub debug_allowed: bool,
    pub selector_prefix: String,
    pub remove_upload_prefix: String,
    pub data_prefix: String,
    pub trigger_prefix: String,
    pub script_path: Option<String>,
    pub css_path: Option<String>,
    /// Keepalive pulse forwarded to generated pages, if any.
    pub keepalive_pulse: Option<String>,
    /// Agent class assumed when the request does not name one.
    pub useragent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8083".into(),
            context_path: String::new(),
            public_url: None,
            stylesheet_path: "file:///usr/local/share/forms/xslt/".into(),
            stylesheet_html: "forms.xsl".into(),
            stylesheet_dojo: "dojo.xsl".into(),
            relative_uris: false,
            upload_dir: "uploads".into(),
            error_page: "error.html".into(),
            preselect_language: String::new(),
            enable_l10n: true,
            debug_allowed: false,
            selector_prefix: SELECTOR_PREFIX_DEFAULT.into(),
            remove_upload_prefix: REMOVE_UPLOAD_PREFIX_DEFAULT.into(),
            data_prefix: DATA_PREFIX_DEFAULT.into(),
            trigger_prefix: TRIGGER_PREFIX_DEFAULT.into(),
            script_path: None,
            css_path: None,
            keepalive_pulse: None,
            useragent: "html".into(),
        }
    }
}

impl Settings {
    /// The configured default stylesheet for a client-agent class.
    pub fn stylesheet_for(&self, agent: UiAgent) -> &str {
        match agent {
            UiAgent::Html => &self.stylesheet_html,
            UiAgent::Dojo => &self.stylesheet_dojo,
        }
    }

    /// Upload destination as a path; relative values resolve against the
    /// process working directory.
    pub fn upload_destination(&self) -> Option<PathBuf> {
        if self.upload_dir.is_empty() {
            return None;
        }
        let path = PathBuf::from(&self.upload_dir);
        if path.is_absolute() {
            Some(path)
        } else {
            env::current_dir().ok().map(|cwd| cwd.join(path))
        }
    }
}

/// Load settings from `agent.toml` when present, then apply environment
/// overrides. Missing or malformed files fall back to defaults.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("agent.toml") {
        match toml::from_str::<Settings>(&raw) {
            Ok(file_settings) => settings = file_settings,
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed agent.toml");
            }
        }
    }

    if let Ok(v) = env::var("AGENT__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Ok(v) = env::var("AGENT__UPLOAD_DIR") {
        settings.upload_dir = v;
    }
    if let Ok(v) = env::var("AGENT__STYLESHEET_PATH") {
        settings.stylesheet_path = v;
    }
    if let Ok(v) = env::var("AGENT__PUBLIC_URL") {
        settings.public_url = Some(v);
    }
    if let Ok(v) = env::var("AGENT__DEBUG_ALLOWED") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.debug_allowed = parsed;
        }
    }

    settings
}
