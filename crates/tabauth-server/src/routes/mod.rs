//! Request handlers.

pub mod ticket;

pub use ticket::{BadQuery, TicketQuery, ticket_handler};
