//! Response rendering for browser and AJAX callers.
//!
//! A controller produces an HTML fragment or a JSON payload. AJAX callers
//! get the fragment wrapped in the standard envelope as `{"message": html}`;
//! plain browser requests get the fragment inside the page layout.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use common::errors::AppResult;
use common::middleware::RequestId;
use common::response::ApiResponse;

use crate::template::Template;
use crate::SERVICE_NAME;

const AJAX_HEADER: &str = "x-requested-with";

/// Per-request response builder.
#[derive(Debug, Clone, Default)]
pub struct ResponseRenderer {
    ajax: bool,
    request_id: Option<String>,
}

impl ResponseRenderer {
    pub fn new(ajax: bool) -> Self {
        Self {
            ajax,
            request_id: None,
        }
    }

    pub fn is_ajax(&self) -> bool {
        self.ajax
    }

    fn envelope<T: Serialize>(&self, data: T) -> ApiResponse<T> {
        let response = ApiResponse::ok(data).with_service(SERVICE_NAME);
        match &self.request_id {
            Some(id) => response.with_request_id(id.clone()),
            None => response,
        }
    }

    /// JSON payload in the standard envelope.
    pub fn json<T: Serialize>(&self, data: T) -> Response {
        Json(self.envelope(data)).into_response()
    }

    /// HTML fragment, as a full page or as `{"message": ...}` for AJAX.
    pub fn html(&self, template: &Template, title: &str, body: String) -> AppResult<Response> {
        if self.ajax {
            return Ok(self.json(json!({ "message": body })));
        }
        let page = template.render("layout.html", json!({ "title": title, "body": body }))?;
        Ok(Html(page).into_response())
    }
}

fn is_ajax_request(parts: &Parts) -> bool {
    let by_header = parts
        .headers
        .get(AJAX_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    let by_query = parts.uri.query().is_some_and(|query| {
        query.split('&').any(|pair| {
            matches!(
                pair.split_once('='),
                Some(("ajax_request", "1" | "true"))
            ) || pair == "ajax_request"
        })
    });
    by_header || by_query
}

impl<S: Send + Sync> FromRequestParts<S> for ResponseRenderer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            ajax: is_ajax_request(parts),
            request_id: parts
                .extensions
                .get::<RequestId>()
                .map(|id| id.as_str().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = header {
            builder = builder.header(AJAX_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_ajax_detection() {
        assert!(is_ajax_request(&parts("/x", Some("XMLHttpRequest"))));
        assert!(is_ajax_request(&parts("/x?db=a&ajax_request=1", None)));
        assert!(is_ajax_request(&parts("/x?ajax_request=true", None)));
        assert!(!is_ajax_request(&parts("/x?ajax_request=0", None)));
        assert!(!is_ajax_request(&parts("/x", None)));
    }

    #[test]
    fn test_html_for_ajax_is_wrapped() {
        let template = Template::new().unwrap();
        let response = ResponseRenderer::new(true)
            .html(&template, "t", "<p>x</p>".to_string())
            .unwrap();
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
    }
}
