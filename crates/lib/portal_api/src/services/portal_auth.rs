//! Portal authentication service: link issuance and delivery on top of
//! `portal_core::auth`.

use portal_core::auth::magic_link::{link_with_token, verify_page};
use portal_core::models::language::Language;
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppResult;
use crate::models::{RequestLinkRequest, RequestLinkResponse};

/// Response message for every accepted link request.
pub const LINK_SENT_MESSAGE: &str = "If this email is registered, a sign-in link has been sent.";

/// Issue a magic link and hand it to the mailer.
///
/// Delivery failures are logged but answered with the same message as a
/// successful send. The raw token and link are only echoed back in
/// development.
pub async fn request_link(
    state: &AppState,
    body: RequestLinkRequest,
) -> AppResult<RequestLinkResponse> {
    let email = body.email.unwrap_or_default();
    let language = body
        .language
        .as_deref()
        .map(Language::from_code)
        .unwrap_or_default();

    let page = verify_page(&state.site_url, language)?;
    let token = state
        .authenticator
        .request_link(&email, body.order_id.as_deref())?;
    let link = link_with_token(page, &token);

    if let Err(e) = state.mailer.send_link(email.trim(), &link, language).await {
        warn!(error = %e, "magic link delivery failed");
    } else {
        info!(%language, "magic link requested");
    }

    let debug = state.config.environment.is_development();
    Ok(RequestLinkResponse {
        success: true,
        message: LINK_SENT_MESSAGE.into(),
        debug_token: debug.then(|| token.clone()),
        debug_link: debug.then(|| link.to_string()),
    })
}
