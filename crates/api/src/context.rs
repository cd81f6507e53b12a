use fintrack_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted into request extensions by [`crate::middleware::auth_middleware`];
/// handlers behind it read it with `Extension<CurrentUser>` and scope every
/// query by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: UserId,
}

impl CurrentUser {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
