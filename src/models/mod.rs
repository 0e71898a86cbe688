//! Domain entities: session status, tracking settings, callback bindings.

pub mod callback;
pub mod session;
pub mod settings;
