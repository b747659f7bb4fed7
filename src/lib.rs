//! Hermes - operator voice console core
//!
//! Client-side state and backend plumbing for an operator call console:
//! the call-session store (one live call display plus a FIFO ring queue),
//! the command gateway and push-event bridge to the host backend, and the
//! surrounding stores (roster, auth, audio, call log).
//!
//! The crate is UI-agnostic. A frontend renders [`session::CallSnapshot`]
//! values and feeds operator input to [`actions::CallActions`]; everything
//! else flows in through [`listeners::Listeners`].

pub mod actions;
pub mod audio;
pub mod auth;
pub mod blink;
pub mod bridge;
pub mod calllog;
pub mod config;
pub mod debounce;
pub mod listeners;
pub mod logging;
pub mod overlay;
pub mod peer;
pub mod session;
pub mod signaling;
