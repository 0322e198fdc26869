//! Live session handles and handshake authentication.

pub mod authenticator;
pub mod handle;

pub use authenticator::WsAuthenticator;
pub use handle::{PushRejected, SessionHandle};
