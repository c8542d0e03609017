mod booking;
mod expense;
mod itinerary;
mod ledger;
mod money;
mod participant;
mod settlement;

pub use booking::*;
pub use expense::*;
pub use itinerary::*;
pub use ledger::*;
pub use money::*;
pub use participant::*;
pub use settlement::*;
