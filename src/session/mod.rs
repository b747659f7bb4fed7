//! Call-session state machine and store
//!
//! Owns the single call-display slot and the incoming-call queue, and
//! reconciles optimistic operator actions with asynchronous backend pushes.
//!
//! ## Display slot transitions
//!
//! ```text
//!             start_outgoing          confirm_outgoing
//! ┌───────┐ ────────────────► ┌──────────┐ ─────────► ┌──────────┐
//! │ EMPTY │                   │ OUTGOING │            │ ACCEPTED │
//! └───────┘ ◄──────────────── └──────────┘            └──────────┘
//!    ▲  ▲       end_call           │ reject_outgoing     │     │ end_call /
//!    │  │                          ▼                     │     │ remove_peer
//!    │  │  dismiss_rejected  ┌──────────┐   error_peer   ▼     │
//!    │  └─────────────────── │ REJECTED │            ┌───────┐ │
//!    │                       └──────────┘            │ ERROR │ │
//!    └───────────────────────────────────────────────┴───────┘◄┘
//!                     dismiss_errored
//! ```
//!
//! Inbound calls never pass through `OUTGOING`: a queued peer is either
//! accepted straight into `ACCEPTED` or removed from the queue without ever
//! occupying the display.

pub mod state;
pub mod store;

pub use state::{CallDisplay, SessionState};
pub use store::{CallSessionStore, CallSnapshot, ObserverId};
