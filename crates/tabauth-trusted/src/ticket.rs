//! Ticket request parameters and response payload.

use bytes::Bytes;

/// Body returned by Tableau Server when no ticket can be issued.
pub const NOT_FOUND_SENTINEL: &[u8] = b"-1\n";

/// Parameters for a single ticket request.
///
/// Optional fields that are empty are treated as absent: they are never sent
/// as empty form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    username: String,
    target_site: Option<String>,
    client_ip: Option<String>,
}

impl TicketRequest {
    /// Request a ticket for `username` on the default site.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            target_site: None,
            client_ip: None,
        }
    }

    /// Target a specific site (the site's URL namespace, not its name).
    pub fn with_target_site(mut self, site: impl Into<String>) -> Self {
        self.target_site = non_empty(site.into());
        self
    }

    /// Bind the ticket to the IP address of the client that will redeem it.
    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = non_empty(ip.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn target_site(&self) -> Option<&str> {
        self.target_site.as_deref()
    }

    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// Form fields to submit, in ascending key order.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = Vec::with_capacity(3);
        if let Some(ip) = self.client_ip() {
            fields.push(("client_ip", ip));
        }
        if let Some(site) = self.target_site() {
            fields.push(("target_site", site));
        }
        fields.push(("username", self.username()));
        fields
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Raw response body from the trusted endpoint.
///
/// Held byte-for-byte as received, trailing newline included. Tickets are
/// credentials, so `Debug` prints only the length.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket(Bytes);

impl Ticket {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self(body.into())
    }

    /// Whether the body is exactly the "no ticket" sentinel.
    pub fn is_not_found(&self) -> bool {
        self.0.as_ref() == NOT_FOUND_SENTINEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Ticket").field(&self.0.len()).finish()
    }
}
