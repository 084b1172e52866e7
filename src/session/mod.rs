mod auth;
mod context;
mod establish;
mod response;

pub use auth::authenticate;
pub use context::{CallContext, SESSION_HEADER};
pub use establish::create_session;
