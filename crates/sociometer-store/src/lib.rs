pub mod atomic;
pub mod error;
pub mod output;
pub mod session;

pub use error::StoreError;
pub use output::{OutputStore, ResultMetadata};
pub use session::{Cookie, Session, SessionStore};
