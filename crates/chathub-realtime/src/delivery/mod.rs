//! Best-effort delivery to online users.

pub mod router;

pub use router::{DeliveryOutcome, DeliveryRouter};
