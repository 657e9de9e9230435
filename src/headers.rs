use crate::types::Credentials;
use http_client::Request;

/// User agent sent with every request
const USER_AGENT: &str = concat!("top5-client/", env!("CARGO_PKG_VERSION"));

/// Add the JSON content negotiation headers every API request carries
pub fn add_json_headers(request: &mut Request) {
    let _ = request.insert_header("User-Agent", USER_AGENT);
    let _ = request.insert_header("Accept", "application/json");
    let _ = request.insert_header("Content-Type", "application/json");
}

/// Attach the bearer token, if the credentials carry one
pub fn add_auth_header(request: &mut Request, credentials: &Credentials) {
    if let Some(token) = credentials.token() {
        let value = format!("Bearer {token}");
        let _ = request.insert_header("Authorization", value.as_str());
    }
}
