/// Identity handed over by the authentication collaborator. Threaded
/// explicitly into the core so session transitions stay testable; the core
/// never reads ambient auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
