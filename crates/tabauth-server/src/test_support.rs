//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use tabauth_config::AccountStore;
use tabauth_trusted::{Result, Ticket, TicketRequest, TicketSource, TrustedError};

use crate::config::ServerConfig;
use crate::state::AppState;

/// `Authorization` header value for the given credentials.
pub(crate) fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

#[derive(Debug)]
enum Behavior {
    Echo,
    Fixed(&'static [u8]),
    Fail,
}

/// In-process ticket source that records what it was asked for.
#[derive(Debug)]
pub(crate) struct MockTickets {
    behavior: Behavior,
    calls: AtomicUsize,
    last: Mutex<Option<TicketRequest>>,
}

impl MockTickets {
    fn with_behavior(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    /// Answers with the submitted form plus a newline.
    pub(crate) fn echo() -> Arc<Self> {
        Self::with_behavior(Behavior::Echo)
    }

    pub(crate) fn fixed(body: &'static [u8]) -> Arc<Self> {
        Self::with_behavior(Behavior::Fixed(body))
    }

    pub(crate) fn failing() -> Arc<Self> {
        Self::with_behavior(Behavior::Fail)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<TicketRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketSource for MockTickets {
    async fn request_ticket(&self, request: &TicketRequest) -> Result<Ticket> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        match self.behavior {
            Behavior::Echo => {
                let mut form = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(request.form_fields())
                    .finish();
                form.push('\n');
                Ok(Ticket::new(form))
            }
            Behavior::Fixed(body) => Ok(Ticket::new(body)),
            Behavior::Fail => Err(TrustedError::InvalidUrl(url::ParseError::EmptyHost)),
        }
    }
}

/// State with a single `foo:bar` account and the given ticket source.
pub(crate) fn test_state_with(tickets: Arc<MockTickets>) -> AppState {
    let accounts: AccountStore = [("foo".to_string(), "bar".to_string())]
        .into_iter()
        .collect();
    AppState::new(
        ServerConfig::default().with_request_logging(false),
        accounts,
        tickets,
    )
}

pub(crate) fn test_state() -> AppState {
    test_state_with(MockTickets::echo())
}
