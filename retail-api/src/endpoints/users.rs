use crate::request::Endpoint;
use retail_auth::UserProfile;
use std::borrow::Cow;

/// Profile of the signed-in user
#[derive(Default, Debug, Clone)]
pub struct CurrentUser;

impl Endpoint for CurrentUser {
    type Data = ();
    type Response = UserProfile;

    fn endpoint(&self) -> Cow<'_, str> {
        "/users/me".into()
    }
}
