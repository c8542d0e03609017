// Application layer - the trip context owning the ledger, itinerary and
// bookings. Every client (CLI, exporters, tests) goes through TripService.

pub mod config;
pub mod error;
pub mod reporting;
pub mod service;

pub use config::*;
pub use error::*;
pub use reporting::*;
pub use service::*;
