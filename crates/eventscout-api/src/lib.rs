// Client for the Ticketmaster Discovery API - the remote side of the cache
pub mod geohash;
pub mod retry;
pub mod ticketmaster;

// Re-export common types
pub use retry::RetryConfig;
pub use ticketmaster::{TicketmasterClient, TicketmasterError, TicketmasterEvent};
