use tracing::debug;

use shared::protocol::{FormRequest, LANG_PARAM};

use crate::config::Settings;

/// Locale used when localization is disabled or nothing else resolves.
pub const FALLBACK_LOCALE: &str = "en";

/// Resolve the session locale.
///
/// Priority: explicit `lang` request parameter, then the request-scoped
/// `lang` attribute, then the configured preselected language, then the
/// `Accept-Language` header prefix, then the hard fallback. With
/// localization disabled the fallback is used unconditionally.
pub fn resolve_locale(request: &FormRequest, settings: &Settings) -> String {
    if !settings.enable_l10n {
        return FALLBACK_LOCALE.to_string();
    }
    if let Some(lang) = request.param(LANG_PARAM) {
        debug!(lang, "using 'lang' url parameter");
        return lang.to_string();
    }
    if let Some(lang) = request.attribute(LANG_PARAM) {
        debug!(lang, "using request attribute 'lang'");
        return lang.to_string();
    }
    if !settings.preselect_language.is_empty() {
        debug!(lang = %settings.preselect_language, "using configured preselect language");
        return settings.preselect_language.clone();
    }
    if let Some(header) = request.accept_language.as_deref() {
        if let Some(prefix) = language_prefix(header) {
            debug!(lang = %prefix, "using accept-language header");
            return prefix;
        }
    }
    FALLBACK_LOCALE.to_string()
}

/// First language tag prefix of an `Accept-Language` header. Malformed
/// values yield `None` rather than an error.
fn language_prefix(header: &str) -> Option<String> {
    let prefix: String = header.trim().chars().take(2).collect();
    if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(prefix.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> FormRequest {
        FormRequest {
            method: "GET".into(),
            ..FormRequest::default()
        }
    }

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn selector_wins_over_attribute() {
        let mut req = request();
        req.params.insert("lang".into(), "fr".into());
        req.attributes.insert("lang".into(), "de".into());
        assert_eq!(resolve_locale(&req, &settings()), "fr");
    }

    #[test]
    fn attribute_wins_over_preselect() {
        let mut req = request();
        req.attributes.insert("lang".into(), "de".into());
        let cfg = Settings {
            preselect_language: "it".into(),
            ..settings()
        };
        assert_eq!(resolve_locale(&req, &cfg), "de");
    }

    #[test]
    fn preselect_wins_over_header() {
        let mut req = request();
        req.accept_language = Some("nl-BE,nl;q=0.9".into());
        let cfg = Settings {
            preselect_language: "it".into(),
            ..settings()
        };
        assert_eq!(resolve_locale(&req, &cfg), "it");
    }

    #[test]
    fn header_prefix_wins_over_fallback() {
        let mut req = request();
        req.accept_language = Some("nl-BE,nl;q=0.9".into());
        assert_eq!(resolve_locale(&req, &settings()), "nl");
    }

    #[test]
    fn falls_back_when_nothing_resolves() {
        assert_eq!(resolve_locale(&request(), &settings()), FALLBACK_LOCALE);
    }

    #[test]
    fn malformed_header_is_ignored_not_fatal() {
        for header in ["*", "1", " ", "!!bad"] {
            let mut req = request();
            req.accept_language = Some(header.into());
            assert_eq!(resolve_locale(&req, &settings()), FALLBACK_LOCALE);
        }
    }

    #[test]
    fn l10n_disabled_forces_fallback() {
        let mut req = request();
        req.params.insert("lang".into(), "fr".into());
        let cfg = Settings {
            enable_l10n: false,
            ..settings()
        };
        assert_eq!(resolve_locale(&req, &cfg), FALLBACK_LOCALE);
    }
}
