//! Public extension contracts supplied by the embedding application.
//!
//! The broker never talks to an appliance itself. Embedders implement
//! [`SessionAuthenticator`] (or wrap two closures in [`FnAuthenticator`]) to perform the actual
//! login and logout handshakes.

pub mod authenticator;

pub use authenticator::*;
