// Provider implementations for remote event APIs
pub mod ticketmaster;

pub use ticketmaster::TicketmasterProvider;
