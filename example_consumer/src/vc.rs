//! Request identity threaded through every entity operation.

use ent_sdk::uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct ViewerContext {
    pub user_id: Option<Uuid>,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: Uuid) -> Self {
        Self { user_id: Some(user_id) }
    }
}
