//! Event bus and live channel
//!
//! ```text
//! Cortex (sync) ──subscribe──► EventBridge ──mpsc──► EventBus::run ──► observers
//! ```
//!
//! The bridge may be fed from any thread. The bus runs on the tokio runtime
//! and fans each envelope out without blocking on slow observers.

mod bridge;
mod bus;
mod envelope;
pub mod live;

pub use bridge::{attach, EventBridge};
pub use bus::{ChannelObserver, DeliveryError, EventBus, Observer, ObserverId};
pub use envelope::{Envelope, EnvelopeKind};
