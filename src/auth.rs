//! Auth collaborators: bearer secrets, token providers, login redirects, and OAuth sessions.

pub mod provider;
pub mod redirect;
pub mod secret;
pub mod session;

pub use provider::*;
pub use redirect::*;
pub use secret::*;
pub use session::*;
