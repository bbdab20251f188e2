//! Caller identity asserted through request headers.
//!
//! The server trusts these headers as-is; it is meant to sit behind a
//! gateway that authenticates callers and sets them.

use axum::http::HeaderMap;
use trace_contract::StaticIdentity;

pub(crate) const AFFILIATION_HEADER: &str = "x-affiliation";
pub(crate) const PERMISSIONS_HEADER: &str = "x-permissions";

/// Build the caller from `X-Affiliation` and `X-Permissions`.
pub(crate) fn caller_from_headers(headers: &HeaderMap) -> StaticIdentity {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let mut caller = StaticIdentity::anonymous();
    caller.affiliation = header(AFFILIATION_HEADER);
    match header(PERMISSIONS_HEADER) {
        Some(permissions) => caller.with_permissions(permissions),
        None => caller,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use trace_contract::IdentityAssertion;

    #[test]
    fn reads_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AFFILIATION_HEADER, HeaderValue::from_static("Retailer"));
        headers.insert(PERMISSIONS_HEADER, HeaderValue::from_static("receive_label"));
        let caller = caller_from_headers(&headers);
        assert_eq!(
            caller,
            StaticIdentity::new("Retailer").with_permissions("receive_label")
        );
        let assertion = IdentityAssertion::resolve(&caller);
        assert!(assertion.has_permission("label"));
    }

    #[test]
    fn missing_headers_resolve_to_defaults() {
        let caller = caller_from_headers(&HeaderMap::new());
        assert_eq!(caller, StaticIdentity::anonymous());
        let assertion = IdentityAssertion::resolve(&caller);
        assert_eq!(assertion.affiliation, "");
        assert!(assertion.has_permission("default"));
    }
}
