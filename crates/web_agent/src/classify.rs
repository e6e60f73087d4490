use shared::protocol::FormRequest;

/// The two kinds of inbound exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// First load of a form; renders a response body.
    Init,
    /// A data-submitting interaction; never renders.
    Update,
}

/// Classify an exchange by its method. POST is an update; every other verb
/// is an initialization. Pure function of the method string.
pub fn classify(request: &FormRequest) -> Exchange {
    if request.method.eq_ignore_ascii_case("POST") {
        Exchange::Update
    } else {
        Exchange::Init
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_method(method: &str) -> FormRequest {
        FormRequest {
            method: method.to_string(),
            ..FormRequest::default()
        }
    }

    #[test]
    fn post_is_update() {
        assert_eq!(classify(&request_with_method("POST")), Exchange::Update);
        assert_eq!(classify(&request_with_method("post")), Exchange::Update);
    }

    #[test]
    fn every_other_verb_is_init() {
        for method in ["GET", "HEAD", "PUT", "DELETE", "OPTIONS", ""] {
            assert_eq!(classify(&request_with_method(method)), Exchange::Init);
        }
    }
}
