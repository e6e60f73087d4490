//! Configures the external generation pipeline for one session: stylesheet
//! selection and the named parameter set derived from configuration and
//! request context. Parameters are rebuilt from scratch on every call.

use tracing::debug;
use url::Url;

use shared::{
    domain::UiAgent,
    error::AgentError,
    protocol::{FormRequest, ACTION_URL_PARAM, DEBUG_PARAM, XSL_PARAM},
};

use crate::{
    config::Settings,
    processor::{GeneratorFactory, UiGenerator},
};

/// Build and parameterize a pipeline instance for this session.
///
/// The stylesheet is the explicit `xslt` request override when present,
/// otherwise the configured default for the client-agent class; either way
/// it resolves against the configured base path.
pub fn create_generator(
    settings: &Settings,
    request: &FormRequest,
    agent: UiAgent,
    session_key: &str,
    factory: &dyn GeneratorFactory,
) -> Result<Box<dyn UiGenerator>, AgentError> {
    let stylesheet = request
        .param(XSL_PARAM)
        .unwrap_or_else(|| settings.stylesheet_for(agent));
    let base = Url::parse(&settings.stylesheet_path).map_err(|error| AgentError::BadUri {
        uri: settings.stylesheet_path.clone(),
        reason: error.to_string(),
    })?;
    let stylesheet_uri = base.join(stylesheet).map_err(|error| AgentError::BadUri {
        uri: stylesheet.to_string(),
        reason: error.to_string(),
    })?;
    debug!(stylesheet = %stylesheet_uri, "configuring generator");

    let mut generator = factory.create(stylesheet_uri);

    if settings.relative_uris {
        generator.set_parameter("contextroot", ".");
    } else {
        generator.set_parameter("contextroot", &request.context_path);
    }
    generator.set_parameter("sessionKey", session_key);
    if let Some(pulse) = settings.keepalive_pulse.as_deref() {
        generator.set_parameter("keepalive-pulse", pulse);
    }
    generator.set_parameter("action-url", &action_url(settings, request, agent));
    if request.param(DEBUG_PARAM).is_some() && settings.debug_allowed {
        generator.set_parameter("debug-enabled", "true");
    }
    generator.set_parameter("selector-prefix", &settings.selector_prefix);
    generator.set_parameter("remove-upload-prefix", &settings.remove_upload_prefix);
    generator.set_parameter("data-prefix", &settings.data_prefix);
    generator.set_parameter("trigger-prefix", &settings.trigger_prefix);
    if let Some(path) = settings.script_path.as_deref() {
        generator.set_parameter("scriptPath", path);
    }
    if let Some(path) = settings.css_path.as_deref() {
        generator.set_parameter("CSSPath", path);
    }

    Ok(generator)
}

/// The action URL emitted into the generated page. An explicit request
/// override wins; otherwise the Dojo agent class gets an absolute URI and
/// the plain-HTML class the request URI as sent.
fn action_url(settings: &Settings, request: &FormRequest, agent: UiAgent) -> String {
    if let Some(url) = request.param(ACTION_URL_PARAM) {
        return url.to_string();
    }
    match agent {
        UiAgent::Dojo => format!(
            "{}{}",
            settings.public_url.as_deref().unwrap_or_default(),
            request.request_uri
        ),
        UiAgent::Html => request.request_uri.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};

    use shared::domain::Document;

    #[derive(Default)]
    struct RecordingGeneratorState {
        params: Vec<(String, String)>,
        stylesheets: Vec<Url>,
    }

    struct RecordingGenerator {
        state: Arc<Mutex<RecordingGeneratorState>>,
    }

    impl UiGenerator for RecordingGenerator {
        fn set_parameter(&mut self, name: &str, value: &str) {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .params
                .push((name.to_string(), value.to_string()));
        }

        fn generate(&mut self, input: &Document) -> Result<Vec<u8>, AgentError> {
            Ok(input.as_str().as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        state: Arc<Mutex<RecordingGeneratorState>>,
    }

    impl GeneratorFactory for RecordingFactory {
        fn create(&self, stylesheet: Url) -> Box<dyn UiGenerator> {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .stylesheets
                .push(stylesheet);
            Box::new(RecordingGenerator {
                state: Arc::clone(&self.state),
            })
        }
    }

    fn request() -> FormRequest {
        FormRequest {
            method: "GET".into(),
            context_path: "/forms-app".into(),
            servlet_path: "/forms".into(),
            request_uri: "/forms-app/forms".into(),
            ..FormRequest::default()
        }
    }

    fn params_of(factory: &RecordingFactory) -> Vec<(String, String)> {
        factory
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .params
            .clone()
    }

    fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_stylesheet_resolves_against_base_path() {
        let factory = RecordingFactory::default();
        create_generator(&Settings::default(), &request(), UiAgent::Html, "k1", &factory)
            .expect("generator");
        let state = factory.state.lock().expect("state");
        assert_eq!(
            state.stylesheets,
            vec![Url::parse("file:///usr/local/share/forms/xslt/forms.xsl").expect("url")]
        );
    }

    #[test]
    fn xslt_override_wins_over_configured_default() {
        let factory = RecordingFactory::default();
        let mut req = request();
        req.params.insert("xslt".into(), "custom.xsl".into());
        create_generator(&Settings::default(), &req, UiAgent::Html, "k1", &factory)
            .expect("generator");
        let state = factory.state.lock().expect("state");
        assert!(state.stylesheets[0].as_str().ends_with("/custom.xsl"));
    }

    #[test]
    fn relative_uri_mode_collapses_contextroot() {
        let factory = RecordingFactory::default();
        let settings = Settings {
            relative_uris: true,
            ..Settings::default()
        };
        create_generator(&settings, &request(), UiAgent::Html, "k1", &factory)
            .expect("generator");
        let params = params_of(&factory);
        assert_eq!(param(&params, "contextroot"), Some("."));
    }

    #[test]
    fn session_key_and_prefixes_are_always_present() {
        let factory = RecordingFactory::default();
        create_generator(&Settings::default(), &request(), UiAgent::Html, "k1", &factory)
            .expect("generator");
        let params = params_of(&factory);
        assert_eq!(param(&params, "sessionKey"), Some("k1"));
        assert_eq!(param(&params, "contextroot"), Some("/forms-app"));
        assert_eq!(param(&params, "selector-prefix"), Some("s_"));
        assert_eq!(param(&params, "remove-upload-prefix"), Some("ru_"));
        assert_eq!(param(&params, "data-prefix"), Some("d_"));
        assert_eq!(param(&params, "trigger-prefix"), Some("t_"));
    }

    #[test]
    fn debug_requires_both_request_and_configuration() {
        let mut req = request();
        req.params.insert("debug".into(), "true".into());

        let factory = RecordingFactory::default();
        create_generator(&Settings::default(), &req, UiAgent::Html, "k1", &factory)
            .expect("generator");
        assert_eq!(param(&params_of(&factory), "debug-enabled"), None);

        let factory = RecordingFactory::default();
        let settings = Settings {
            debug_allowed: true,
            ..Settings::default()
        };
        create_generator(&settings, &req, UiAgent::Html, "k1", &factory).expect("generator");
        assert_eq!(param(&params_of(&factory), "debug-enabled"), Some("true"));
    }

    #[test]
    fn dojo_action_url_is_absolute_html_is_as_sent() {
        let settings = Settings {
            public_url: Some("https://forms.example".into()),
            ..Settings::default()
        };
        assert_eq!(
            action_url(&settings, &request(), UiAgent::Dojo),
            "https://forms.example/forms-app/forms"
        );
        assert_eq!(
            action_url(&settings, &request(), UiAgent::Html),
            "/forms-app/forms"
        );

        let mut req = request();
        req.params
            .insert("action_url".into(), "/elsewhere".into());
        assert_eq!(action_url(&settings, &req, UiAgent::Dojo), "/elsewhere");
    }
}
