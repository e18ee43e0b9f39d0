//! Trusted ticket endpoint: `GET /user/{subject}/ticket[?site_id=..][&client_ip=..]`.

use axum::{
    Extension,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tabauth_trusted::{Ticket, TicketRequest};
use thiserror::Error;
use tracing::info;

use crate::auth::Caller;
use crate::error::GatewayError;
use crate::path::{extract_subject, percent_decode};
use crate::state::AppState;

/// The query string holds a malformed escape or non-UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad query string '{query}'")]
pub struct BadQuery {
    /// The raw (undecoded) query string.
    pub query: String,
}

/// Optional query parameters, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub site_id: Option<String>,
    pub client_ip: Option<String>,
}

impl TicketQuery {
    /// Parse from a raw (form-urlencoded) query string.
    ///
    /// Every key and value must decode cleanly, unknown keys included;
    /// nothing is replaced or dropped silently.
    pub fn parse(query: Option<&str>) -> Result<Self, BadQuery> {
        let mut parsed = Self::default();
        let Some(query) = query else {
            return Ok(parsed);
        };
        let bad_query = || BadQuery {
            query: query.to_string(),
        };

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_form_component(key).ok_or_else(bad_query)?;
            let value = decode_form_component(value).ok_or_else(bad_query)?;

            let slot = match key.as_str() {
                "site_id" => &mut parsed.site_id,
                "client_ip" => &mut parsed.client_ip,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        Ok(parsed)
    }

    /// Build the ticket request for `subject`.
    pub fn into_request(self, subject: String) -> TicketRequest {
        let mut request = TicketRequest::new(subject);
        if let Some(site) = self.site_id {
            request = request.with_target_site(site);
        }
        if let Some(ip) = self.client_ip {
            request = request.with_client_ip(ip);
        }
        request
    }
}

/// Handle every authenticated request.
///
/// Path validation, one ticket request, then sentinel mapping. Runs behind
/// [`auth_middleware`](crate::auth::auth_middleware).
pub async fn ticket_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    uri: Uri,
) -> Result<Response, GatewayError> {
    let subject = extract_subject(uri.path())?;
    let request = TicketQuery::parse(uri.query())?.into_request(subject);

    let ticket = state.tickets.request_ticket(&request).await?;

    if ticket.is_not_found() {
        return Err(GatewayError::TicketNotFound {
            subject: request.username().to_string(),
        });
    }

    info!(
        caller = %caller.username,
        subject = %request.username(),
        target_site = request.target_site().unwrap_or_default(),
        "Issued trusted ticket"
    );

    Ok(ticket_response(ticket))
}

fn decode_form_component(raw: &str) -> Option<String> {
    percent_decode(&raw.replace('+', " ")).map(|decoded| decoded.into_owned())
}

fn ticket_response(ticket: Ticket) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ticket.into_bytes(),
    )
        .into_response()
}
