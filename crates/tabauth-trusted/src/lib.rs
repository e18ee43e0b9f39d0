//! Client for the Tableau Server trusted authentication API.
//!
//! A trusted host exchanges a username (plus optional site and client IP)
//! for a short-lived ticket by POSTing a form to `{base-url}/trusted`.
//! See <https://help.tableau.com/current/server/en-us/trusted_auth.htm>.
//!
//! # Components
//!
//! - [`ticket`] : request parameters and the opaque ticket payload
//! - [`client`] : the [`TicketSource`] seam and its HTTP implementation

pub mod client;
pub mod error;
pub mod ticket;

pub use client::{SharedTicketSource, TRUSTED_PATH, TicketSource, TrustedClient};
pub use error::{Result, TrustedError};
pub use ticket::{NOT_FOUND_SENTINEL, Ticket, TicketRequest};
