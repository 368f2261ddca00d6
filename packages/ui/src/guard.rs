//! Route gating from the session state.

use crate::session::SessionState;

/// Who may open a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

/// What the router should do with a navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Allow,
    /// The session is still resolving; render nothing yet.
    Wait,
    Redirect(&'static str),
}

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

pub fn gate(access: Access, session: &SessionState) -> Gate {
    match access {
        Access::Public => Gate::Allow,
        _ if session.is_loading() => Gate::Wait,
        Access::Authenticated if session.session().is_some() => Gate::Allow,
        Access::Authenticated => Gate::Redirect(LOGIN_PATH),
        Access::Admin if session.is_admin() => Gate::Allow,
        Access::Admin => Gate::Redirect(HOME_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use store::{Identity, Profile, Tier};

    fn signed_in(tier: Option<Tier>) -> SessionState {
        let identity = Identity {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
        };
        let profile = tier.map(|tier| Profile {
            id: "u1".to_string(),
            email: None,
            tier,
            created_at: None,
        });
        SessionState::Authenticated(Session { identity, profile })
    }

    #[test]
    fn test_public_pages_never_wait() {
        assert_eq!(gate(Access::Public, &SessionState::Loading), Gate::Allow);
        assert_eq!(gate(Access::Public, &SessionState::Anonymous), Gate::Allow);
    }

    #[test]
    fn test_loading_waits() {
        assert_eq!(gate(Access::Admin, &SessionState::Loading), Gate::Wait);
        assert_eq!(gate(Access::Authenticated, &SessionState::Loading), Gate::Wait);
    }

    #[test]
    fn test_admin_pages() {
        assert_eq!(gate(Access::Admin, &signed_in(Some(Tier::Admin))), Gate::Allow);
        assert_eq!(gate(Access::Admin, &signed_in(Some(Tier::Paid))), Gate::Redirect("/"));
        assert_eq!(gate(Access::Admin, &signed_in(None)), Gate::Redirect("/"));
        assert_eq!(gate(Access::Admin, &SessionState::Anonymous), Gate::Redirect("/"));
    }

    #[test]
    fn test_authenticated_pages() {
        assert_eq!(gate(Access::Authenticated, &signed_in(None)), Gate::Allow);
        assert_eq!(
            gate(Access::Authenticated, &SessionState::Anonymous),
            Gate::Redirect("/login")
        );
    }
}
