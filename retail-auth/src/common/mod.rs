mod models;

pub use models::{
    LoginResponse, RefreshGrant, Session, StoredSession, TokenPair, UserProfile,
};
pub(crate) use models::expiry_from_now;
