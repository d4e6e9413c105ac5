use crate::ports::Route;
use crate::session::{Identity, Session, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Loading,
    Redirect(Route),
    Granted(Identity),
}

/// Decides what a protected screen shows for the given session.
pub fn evaluate(session: Option<&Session>) -> Access {
    match session.map(Session::state) {
        None | Some(SessionState::Anonymous) => Access::Redirect(Route::Login),
        Some(SessionState::Authenticating { .. }) => Access::Loading,
        Some(SessionState::Authenticated(identity)) => Access::Granted(identity.clone()),
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::ports::CheckOutcome;

    #[test]
    fn evaluate__should_redirect_without_session() {
        // Then
        assert_eq!(evaluate(None), Access::Redirect(Route::Login));
        assert_eq!(
            evaluate(Some(&Session::new())),
            Access::Redirect(Route::Login)
        );
    }

    #[test]
    fn evaluate__should_show_loading_while_authenticating() {
        // Given
        let mut session = Session::new();
        session.begin_login("ian@yixy.com").expect("begin");

        // Then
        assert_eq!(evaluate(Some(&session)), Access::Loading);
    }

    #[test]
    fn evaluate__should_grant_authenticated_identity() {
        // Given
        let mut session = Session::new();
        let attempt = session.begin_login("ian@yixy.com").expect("begin");
        session.complete_login(
            attempt,
            Ok(CheckOutcome::Accepted {
                display_name: "Ian".to_string(),
            }),
        );

        // When
        let access = evaluate(Some(&session));

        // Then
        assert_eq!(
            access,
            Access::Granted(Identity {
                email: "ian@yixy.com".to_string(),
                display_name: "Ian".to_string(),
            })
        );
    }
}
