//! Campaign services built on the composition state.
//!
//! ARCHITECTURE
//! ============
//! `poller` and `dispatch` each own one background concern (the stats
//! session and the in-flight dispatch set). `console` composes them with the
//! state models into the controller the command line drives.

pub mod console;
pub mod dispatch;
pub mod poller;
