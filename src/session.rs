//! Session collaborator for the dashboard.
//!
//! Authentication lives outside this crate. The dashboard only needs to know
//! whether it may render (the route guard) and how to end the session.

/// Capability handed to the dashboard by whoever owns authentication.
pub trait Session {
    /// Route guard: the dashboard renders only while this holds.
    fn is_authenticated(&self) -> bool;

    /// End the session. The dashboard exits afterwards.
    fn sign_out(&mut self);

    /// Display name for the header, if known.
    fn user_label(&self) -> Option<String> {
        None
    }
}

/// The local terminal user: authenticated until they sign out.
#[derive(Debug, Clone)]
pub struct LocalSession {
    user: Option<String>,
    active: bool,
}

impl LocalSession {
    pub fn new(user: Option<String>) -> Self {
        Self { user, active: true }
    }

    /// Session for the OS user running the process.
    pub fn from_env() -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|u| !u.is_empty());
        Self::new(user)
    }
}

impl Session for LocalSession {
    fn is_authenticated(&self) -> bool {
        self.active
    }

    fn sign_out(&mut self) {
        tracing::info!(user = ?self.user, "signed out");
        self.active = false;
    }

    fn user_label(&self) -> Option<String> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_out_closes_the_guard() {
        let mut session = LocalSession::new(Some("dairy".to_string()));
        assert!(session.is_authenticated());
        assert_eq!(session.user_label().as_deref(), Some("dairy"));

        session.sign_out();
        assert!(!session.is_authenticated());
    }
}
