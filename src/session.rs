use crate::ports::{BoundaryError, CheckOutcome, CredentialCheck, Navigator, Route, TimeProvider};

use thiserror::Error;
use tracing::{debug, info, warn};

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const LOGIN_FAILED: &str = "An error occurred during login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub display_name: String,
}

/// Ties a credential-check result to the login call that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating { attempt: AttemptId },
    Authenticated(Identity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFailure {
    Boundary(BoundaryError),
    TimedOut,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Identity),
    Rejected,
    Failed,
    /// The session moved on (logout, newer attempt) before the result came back.
    Superseded,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a login attempt is already in flight")]
    LoginInFlight,
}

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    error: Option<String>,
    email: String,
    attempts: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Anonymous,
            error: None,
            email: String::new(),
            attempts: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Authenticating { .. })
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Email of the most recent login attempt, kept across failures.
    pub fn last_email(&self) -> &str {
        &self.email
    }

    pub fn begin_login(&mut self, email: &str) -> Result<AttemptId, SessionError> {
        if self.is_loading() {
            return Err(SessionError::LoginInFlight);
        }
        self.attempts += 1;
        let attempt = AttemptId(self.attempts);
        self.error = None;
        self.email = email.to_string();
        self.state = SessionState::Authenticating { attempt };
        Ok(attempt)
    }

    /// Applies a credential-check result. Results for any attempt other than
    /// the one in flight are dropped without touching the session.
    pub fn complete_login(
        &mut self,
        attempt: AttemptId,
        result: Result<CheckOutcome, LoginFailure>,
    ) -> LoginOutcome {
        if self.state != (SessionState::Authenticating { attempt }) {
            return LoginOutcome::Superseded;
        }

        match result {
            Ok(CheckOutcome::Accepted { display_name }) => {
                let identity = Identity {
                    email: self.email.clone(),
                    display_name,
                };
                self.state = SessionState::Authenticated(identity.clone());
                LoginOutcome::Authenticated(identity)
            }
            Ok(CheckOutcome::Rejected) => {
                self.state = SessionState::Anonymous;
                self.error = Some(INVALID_CREDENTIALS.to_string());
                LoginOutcome::Rejected
            }
            Err(_) => {
                self.state = SessionState::Anonymous;
                self.error = Some(LOGIN_FAILED.to_string());
                LoginOutcome::Failed
            }
        }
    }

    pub fn logout(&mut self) -> Route {
        self.state = SessionState::Anonymous;
        self.error = None;
        self.email.clear();
        Route::Login
    }
}

/// Shared handle to one browser's session. Every consumer gets a clone of
/// the handle; the session itself only changes through login and logout.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Session {
        self.inner.lock().expect("session lock").clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.lock().expect("session lock").identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().expect("session lock").is_loading()
    }

    pub fn begin_login(&self, email: &str) -> Result<AttemptId, SessionError> {
        self.inner.lock().expect("session lock").begin_login(email)
    }

    pub fn complete_login(
        &self,
        attempt: AttemptId,
        result: Result<CheckOutcome, LoginFailure>,
    ) -> LoginOutcome {
        self.inner
            .lock()
            .expect("session lock")
            .complete_login(attempt, result)
    }

    pub fn logout<N: Navigator>(&self, navigator: &N) {
        let route = self.inner.lock().expect("session lock").logout();
        navigator.go_to(route);
    }
}

struct PendingLogin<'a> {
    session: &'a SessionHandle,
    attempt: Option<AttemptId>,
}

impl PendingLogin<'_> {
    fn finish(mut self, result: Result<CheckOutcome, LoginFailure>) -> LoginOutcome {
        match self.attempt.take() {
            Some(attempt) => self.session.complete_login(attempt, result),
            None => LoginOutcome::Superseded,
        }
    }
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            warn!("login attempt abandoned before completion");
            self.session
                .complete_login(attempt, Err(LoginFailure::Abandoned));
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginService<C, T> {
    checker: C,
    time: T,
    timeout: Duration,
}

impl<C, T> LoginService<C, T>
where
    C: CredentialCheck,
    T: TimeProvider,
{
    pub fn new(checker: C, time: T, timeout: Duration) -> Self {
        Self {
            checker,
            time,
            timeout,
        }
    }

    /// Runs one login attempt against `session`. Navigates to the booking
    /// screen on success; every other exit leaves the session anonymous with
    /// an error, unless the session moved on while the check was running.
    pub async fn login<N>(
        &self,
        session: &SessionHandle,
        navigator: &N,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, SessionError>
    where
        N: Navigator + Sync,
    {
        let attempt = session.begin_login(email)?;
        let pending = PendingLogin {
            session,
            attempt: Some(attempt),
        };

        let result = tokio::select! {
            outcome = self.checker.check(email, password) => outcome.map_err(LoginFailure::Boundary),
            () = self.time.sleep(self.timeout) => Err(LoginFailure::TimedOut),
        };
        if let Err(failure) = &result {
            warn!(email, ?failure, "credential check failed");
        }

        let outcome = pending.finish(result);
        match &outcome {
            LoginOutcome::Authenticated(identity) => {
                info!(email, name = %identity.display_name, "login accepted");
                navigator.go_to(Route::Booking);
            }
            LoginOutcome::Rejected => info!(email, "login rejected"),
            LoginOutcome::Failed => warn!(email, "login failed"),
            LoginOutcome::Superseded => debug!(email, "stale login result ignored"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use time::OffsetDateTime;
    use tokio::sync::{Notify, oneshot};

    #[derive(Clone, Default)]
    struct RecordingNavigator {
        routes: Arc<Mutex<Vec<Route>>>,
    }

    impl RecordingNavigator {
        fn routes(&self) -> Vec<Route> {
            self.routes.lock().expect("routes lock").clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn go_to(&self, route: Route) {
            self.routes.lock().expect("routes lock").push(route);
        }
    }

    /// Sleeps never finish, so the timeout branch only wins when the check hangs.
    #[derive(Clone)]
    struct FrozenTime {
        fire: Arc<Notify>,
    }

    impl FrozenTime {
        fn new() -> Self {
            Self {
                fire: Arc::new(Notify::new()),
            }
        }
    }

    impl TimeProvider for FrozenTime {
        type Sleep<'a>
            = Pin<Box<dyn Future<Output = ()> + Send + 'a>>
        where
            Self: 'a;

        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::UNIX_EPOCH
        }

        fn sleep<'a>(&'a self, _duration: Duration) -> Self::Sleep<'a> {
            Box::pin(self.fire.notified())
        }
    }

    #[derive(Clone)]
    enum Script {
        Accept(&'static str),
        Reject,
        Fail,
        Hang,
    }

    #[derive(Clone)]
    struct ScriptedCheck {
        script: Script,
    }

    impl ScriptedCheck {
        fn new(script: Script) -> Self {
            Self { script }
        }
    }

    impl CredentialCheck for ScriptedCheck {
        type Fut<'a>
            = Pin<Box<dyn Future<Output = Result<CheckOutcome, BoundaryError>> + Send + 'a>>
        where
            Self: 'a;

        fn check<'a>(&'a self, _email: &'a str, _password: &'a str) -> Self::Fut<'a> {
            let script = self.script.clone();
            Box::pin(async move {
                match script {
                    Script::Accept(name) => Ok(CheckOutcome::Accepted {
                        display_name: name.to_string(),
                    }),
                    Script::Reject => Ok(CheckOutcome::Rejected),
                    Script::Fail => Err(BoundaryError::new("credentials", "connection reset")),
                    Script::Hang => std::future::pending().await,
                }
            })
        }
    }

    /// Check that parks until the test releases it.
    #[derive(Clone)]
    struct GatedCheck {
        gate: Arc<Mutex<Option<oneshot::Receiver<CheckOutcome>>>>,
    }

    impl CredentialCheck for GatedCheck {
        type Fut<'a>
            = Pin<Box<dyn Future<Output = Result<CheckOutcome, BoundaryError>> + Send + 'a>>
        where
            Self: 'a;

        fn check<'a>(&'a self, _email: &'a str, _password: &'a str) -> Self::Fut<'a> {
            let receiver = self.gate.lock().expect("gate lock").take();
            Box::pin(async move {
                match receiver {
                    Some(receiver) => receiver
                        .await
                        .map_err(|_| BoundaryError::new("credentials", "gate dropped")),
                    None => Err(BoundaryError::new("credentials", "gate already used")),
                }
            })
        }
    }

    fn service(script: Script) -> LoginService<ScriptedCheck, FrozenTime> {
        LoginService::new(
            ScriptedCheck::new(script),
            FrozenTime::new(),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn login__should_authenticate_and_navigate_to_booking() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let service = service(Script::Accept("Ian"));

        // When
        let outcome = service
            .login(&session, &navigator, "ian@yixy.com", "yixyian")
            .await
            .expect("login");

        // Then
        let identity = Identity {
            email: "ian@yixy.com".to_string(),
            display_name: "Ian".to_string(),
        };
        assert_eq!(outcome, LoginOutcome::Authenticated(identity.clone()));
        assert_eq!(session.identity(), Some(identity));
        assert!(!session.is_loading());
        assert_eq!(navigator.routes(), vec![Route::Booking]);
    }

    #[tokio::test]
    async fn login__should_set_error_and_keep_email_on_rejection() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let service = service(Script::Reject);

        // When
        let outcome = service
            .login(&session, &navigator, "ian@yixy.com", "wrong")
            .await
            .expect("login");

        // Then
        assert_eq!(outcome, LoginOutcome::Rejected);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state(), &SessionState::Anonymous);
        assert_eq!(snapshot.error(), Some(INVALID_CREDENTIALS));
        assert_eq!(snapshot.last_email(), "ian@yixy.com");
        assert!(!snapshot.is_loading());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn login__should_set_generic_error_on_boundary_failure() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let service = service(Script::Fail);

        // When
        let outcome = service
            .login(&session, &navigator, "ian@yixy.com", "yixyian")
            .await
            .expect("login");

        // Then
        assert_eq!(outcome, LoginOutcome::Failed);
        assert_eq!(session.snapshot().error(), Some(LOGIN_FAILED));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn login__should_fail_when_timeout_elapses() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let time = FrozenTime::new();
        let service = LoginService::new(
            ScriptedCheck::new(Script::Hang),
            time.clone(),
            Duration::from_millis(50),
        );

        // When
        let login = service.login(&session, &navigator, "ian@yixy.com", "yixyian");
        let fire = async {
            tokio::task::yield_now().await;
            time.fire.notify_waiters();
        };
        let (outcome, ()) = tokio::join!(login, fire);

        // Then
        assert_eq!(outcome.expect("login"), LoginOutcome::Failed);
        assert_eq!(session.snapshot().error(), Some(LOGIN_FAILED));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn login__should_clear_previous_error_when_starting() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        service(Script::Reject)
            .login(&session, &navigator, "ian@yixy.com", "wrong")
            .await
            .expect("first login");
        assert!(session.snapshot().error().is_some());

        // When
        session.begin_login("ian@yixy.com").expect("begin login");

        // Then
        assert_eq!(session.snapshot().error(), None);
        assert!(session.is_loading());
    }

    #[tokio::test]
    async fn login__should_refuse_second_attempt_while_in_flight() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let (release, gate) = oneshot::channel();
        let service = LoginService::new(
            GatedCheck {
                gate: Arc::new(Mutex::new(Some(gate))),
            },
            FrozenTime::new(),
            Duration::from_secs(10),
        );
        let second = service.clone();

        // When
        let first = service.login(&session, &navigator, "ian@yixy.com", "yixyian");
        let duplicate = async {
            tokio::task::yield_now().await;
            assert!(session.is_loading());
            let result = second
                .login(&session, &navigator, "ian@yixy.com", "yixyian")
                .await;
            let _ = release.send(CheckOutcome::Accepted {
                display_name: "Ian".to_string(),
            });
            result
        };
        let (first, duplicate) = tokio::join!(first, duplicate);

        // Then
        assert_eq!(duplicate, Err(SessionError::LoginInFlight));
        assert!(matches!(first, Ok(LoginOutcome::Authenticated(_))));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn login__should_ignore_result_arriving_after_logout() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let (release, gate) = oneshot::channel();
        let service = LoginService::new(
            GatedCheck {
                gate: Arc::new(Mutex::new(Some(gate))),
            },
            FrozenTime::new(),
            Duration::from_secs(10),
        );

        // When
        let login = service.login(&session, &navigator, "ian@yixy.com", "yixyian");
        let interrupt = async {
            tokio::task::yield_now().await;
            session.logout(&navigator);
            let _ = release.send(CheckOutcome::Accepted {
                display_name: "Ian".to_string(),
            });
        };
        let (outcome, ()) = tokio::join!(login, interrupt);

        // Then
        assert_eq!(outcome.expect("login"), LoginOutcome::Superseded);
        assert_eq!(session.snapshot().state(), &SessionState::Anonymous);
        assert_eq!(session.snapshot().error(), None);
        assert_eq!(navigator.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn login__should_reset_loading_when_future_is_dropped() {
        // Given
        let session = SessionHandle::new();
        let navigator = RecordingNavigator::default();
        let service = service(Script::Hang);

        // When
        {
            let mut login = Box::pin(service.login(&session, &navigator, "ian@yixy.com", "pw"));
            let waker = std::task::Waker::noop();
            let mut cx = Context::from_waker(waker);
            assert!(matches!(login.as_mut().poll(&mut cx), Poll::Pending));
            assert!(session.is_loading());
        }

        // Then
        assert!(!session.is_loading());
        assert_eq!(session.snapshot().error(), Some(LOGIN_FAILED));
    }

    #[test]
    fn complete_login__should_ignore_older_attempt() {
        // Given
        let mut session = Session::new();
        let first = session.begin_login("ian@yixy.com").expect("begin");
        session.complete_login(first, Err(LoginFailure::TimedOut));
        let second = session.begin_login("ian@yixy.com").expect("begin again");

        // When
        let outcome = session.complete_login(
            first,
            Ok(CheckOutcome::Accepted {
                display_name: "Ian".to_string(),
            }),
        );

        // Then
        assert_eq!(outcome, LoginOutcome::Superseded);
        assert_eq!(
            session.state(),
            &SessionState::Authenticating { attempt: second }
        );
    }

    #[test]
    fn logout__should_be_idempotent() {
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
        let first = session.logout();
        let second = session.logout();

        // Then
        assert_eq!(first, Route::Login);
        assert_eq!(second, Route::Login);
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(session.error().is_none());
    }

    #[test]
    fn logout__should_forget_last_email() {
        // Given
        let mut session = Session::new();
        let attempt = session.begin_login("ian@yixy.com").expect("begin");
        session.complete_login(attempt, Ok(CheckOutcome::Rejected));
        assert_eq!(session.last_email(), "ian@yixy.com");

        // When
        session.logout();

        // Then
        assert_eq!(session.last_email(), "");
        assert!(session.error().is_none());
    }
}
