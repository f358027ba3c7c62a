//! The access gate: one pass of the session state machine per request.
//!
//! ```text
//! Start ─► cookies + secret? ─► signature valid? ─► decoded? ─► expired? ─┬─► Resolving ─► Decision
//!              │ no                 │ no               │ no        yes   │        ▲
//!              ▼                    ▼                  ▼                 ▼        │
//!            Fail ◄─────────────────┴──────────────────┴────────── Refreshing ────┘
//!              │                                          (failure)      (success)
//!              └─► Decision (no user, cookies cleared)
//! ```
//!
//! `Decision` denies an anonymous request under the protected path with a
//! 403 login page and lets everything else through with a [`CurrentUser`].
//! The gate is framework-agnostic; the adapters in [`crate::api`] feed it the
//! two cookie values and the request path, then apply the returned
//! [`Outcome`] to the response.

use std::sync::Arc;

use chrono::Utc;

use crate::events::{GateEvent, dispatch};
use crate::refresh::{HttpSessionRefresher, SessionRefresher};
use crate::resolver::{LocalUser, UserResolver};
use crate::session::{self, SessionCookiePair, SessionRecord};
use crate::{GateConfig, GateError, RemoteProfile, ScriptInjector};

/// What to do with the `_ubd`/`_ubs` cookies on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    /// Leave the client's cookies alone.
    Keep,
    /// Set both cookies to a refreshed pair.
    Install(SessionCookiePair),
    /// Expire both cookies.
    Clear,
}

/// The user attached to a request that was let through.
///
/// `logged_in` is true exactly when `user` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser<U> {
    user: Option<U>,
    logged_in: bool,
}

impl<U> CurrentUser<U> {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            logged_in: false,
        }
    }

    pub fn signed_in(user: U) -> Self {
        Self {
            user: Some(user),
            logged_in: true,
        }
    }

    pub fn user(&self) -> Option<&U> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn into_inner(self) -> Option<U> {
        self.user
    }
}

impl<U> From<Option<U>> for CurrentUser<U> {
    fn from(user: Option<U>) -> Self {
        user.map_or_else(Self::anonymous, Self::signed_in)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision<U> {
    /// Hand the request to the next stage with this user attached.
    Allow(CurrentUser<U>),
    /// Answer 403 with this page.
    Deny { login_page: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<U> {
    pub cookies: CookieUpdate,
    pub decision: Decision<U>,
}

/// Authenticates requests against Userbin session cookies.
///
/// Cheap to clone; the configuration, refresher and hooks are shared.
pub struct AccessGate<U> {
    config: Arc<GateConfig>,
    refresher: Arc<dyn SessionRefresher>,
    resolver: UserResolver<U>,
    injector: ScriptInjector,
}

impl<U> Clone for AccessGate<U> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            refresher: Arc::clone(&self.refresher),
            resolver: self.resolver.clone(),
            injector: self.injector.clone(),
        }
    }
}

impl<U: LocalUser> AccessGate<U> {
    /// Builds a gate. The resolver's hook timeout is replaced by the
    /// configured `resolve_timeout`.
    ///
    /// Missing credentials are logged, not rejected: every request is then
    /// handled as anonymous.
    pub fn new(
        config: GateConfig,
        refresher: impl SessionRefresher + 'static,
        mut resolver: UserResolver<U>,
    ) -> Self {
        if let Err(e) = config.validate() {
            log::warn!(target: "userbin", "msg=\"{e}\"");
        }

        resolver.timeout = config.resolve_timeout();
        let injector = ScriptInjector::new(&config);

        Self {
            config: Arc::new(config),
            refresher: Arc::new(refresher),
            resolver,
            injector,
        }
    }

    /// Builds a gate that refreshes sessions against `config.api_endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `GateError::ConfigurationError` if the HTTP client cannot be built.
    pub fn with_http_refresher(
        config: GateConfig,
        resolver: UserResolver<U>,
    ) -> Result<Self, GateError> {
        let refresher = HttpSessionRefresher::new(&config)?;
        Ok(Self::new(config, refresher, resolver))
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn injector(&self) -> &ScriptInjector {
        &self.injector
    }

    /// Runs the state machine for one request.
    ///
    /// `data` and `signature` are the raw `_ubd` and `_ubs` cookie values;
    /// `request_path` is the original path and query, used for the
    /// protected-path check and as the post-login redirect target.
    ///
    /// Never fails: every error ends in an anonymous `Allow` or a `Deny`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "authenticate", skip(self, data, signature))
    )]
    pub async fn authenticate(
        &self,
        data: Option<&str>,
        signature: Option<&str>,
        request_path: &str,
    ) -> Outcome<U> {
        let had_cookies = data.is_some() || signature.is_some();

        let (cookies, user) = match self.establish(data, signature).await {
            Ok((cookies, profile)) => match self.resolver.resolve(profile).await {
                Ok(user) => (cookies, Some(user)),
                // The session itself is sound; the host's hooks are not.
                Err(GateError::UnresolvableUser) => (cookies, None),
                Err(e) => (self.fail(&e, true).await, None),
            },
            Err(e) => (self.fail(&e, had_cookies).await, None),
        };

        Outcome {
            cookies,
            decision: self.decide(user, request_path).await,
        }
    }

    /// Validates the session, refreshing it once if it has expired.
    async fn establish(
        &self,
        data: Option<&str>,
        signature: Option<&str>,
    ) -> Result<(CookieUpdate, RemoteProfile), GateError> {
        if self.config.api_secret().is_empty() {
            return Err(GateError::MissingCredentials);
        }

        let pair =
            SessionCookiePair::from_values(data, signature).ok_or(GateError::MissingSession)?;
        let record = self.verify(&pair)?;

        if !record.is_expired() {
            return Ok((CookieUpdate::Keep, record.profile));
        }

        let refreshed = tokio::time::timeout(
            self.config.refresh_timeout(),
            self.refresher.refresh(&record.id),
        )
        .await
        .map_err(|_| GateError::Timeout)??;

        let renewed = self.verify(&refreshed)?;

        dispatch(GateEvent::SessionRefreshed {
            session_id: record.id,
            at: Utc::now(),
        })
        .await;

        Ok((CookieUpdate::Install(refreshed), renewed.profile))
    }

    fn verify(&self, pair: &SessionCookiePair) -> Result<SessionRecord, GateError> {
        if !pair.is_valid(self.config.api_secret()) {
            return Err(GateError::InvalidSignature);
        }
        session::decode(&pair.data)
    }

    /// The `Fail` transition: log, and clear the cookies if there were any.
    async fn fail(&self, error: &GateError, clear: bool) -> CookieUpdate {
        match error {
            GateError::MissingSession => {
                log::debug!(target: "userbin", "msg=\"no session cookies\"");
            }
            GateError::MissingCredentials => {
                log::warn!(target: "userbin", "msg=\"{error}\"");
            }
            _ => {
                log::warn!(
                    target: "userbin",
                    "msg=\"session rejected\" reason=\"{}\" error=\"{error}\"",
                    error.reason()
                );
            }
        }

        if !clear {
            return CookieUpdate::Keep;
        }

        dispatch(GateEvent::SessionRejected {
            reason: error.reason(),
            at: Utc::now(),
        })
        .await;

        CookieUpdate::Clear
    }

    async fn decide(&self, user: Option<U>, request_path: &str) -> Decision<U> {
        if user.is_none() && self.config.is_protected(request_path) {
            log::info!(
                target: "userbin",
                "msg=\"anonymous request to protected path\" path=\"{request_path}\""
            );
            dispatch(GateEvent::AccessDenied {
                path: request_path.to_owned(),
                at: Utc::now(),
            })
            .await;

            return Decision::Deny {
                login_page: self.injector.login_page(request_path),
            };
        }

        log::debug!(
            target: "userbin",
            "msg=\"request allowed\" path=\"{request_path}\" logged_in={}",
            user.is_some()
        );
        Decision::Allow(CurrentUser::from(user))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::MockSessionRefresher;

    const SECRET: &str = "s3cr3t";

    fn config() -> GateConfig {
        GateConfig::new("app-1", SECRET)
    }

    fn payload(session_id: &str, expires_at: i64, user_id: &str) -> String {
        json!({"id": session_id, "expires_at": expires_at, "user": {"id": user_id}}).to_string()
    }

    fn signed(data: &str) -> SessionCookiePair {
        SessionCookiePair::signed(data, &SECRET.into())
    }

    fn future_ms() -> i64 {
        (Utc::now() + chrono::Duration::hours(1)).timestamp_millis()
    }

    fn past_ms() -> i64 {
        (Utc::now() - chrono::Duration::hours(1)).timestamp_millis()
    }

    fn gate(refresher: MockSessionRefresher) -> AccessGate<RemoteProfile> {
        AccessGate::new(config(), refresher, UserResolver::new())
    }

    async fn run<U: LocalUser>(
        gate: &AccessGate<U>,
        pair: &SessionCookiePair,
        path: &str,
    ) -> Outcome<U> {
        gate.authenticate(Some(&pair.data), Some(&pair.signature), path)
            .await
    }

    fn allowed<U>(outcome: Outcome<U>) -> CurrentUser<U> {
        match outcome.decision {
            Decision::Allow(current) => current,
            Decision::Deny { .. } => panic!("expected the request to be allowed"),
        }
    }

    #[tokio::test]
    async fn test_valid_session_attaches_profile() {
        let data = r#"{"id":"s1","expires_at":9999999999999,"user":{"id":"u1"}}"#;
        let pair = signed(data);

        let outcome = run(&gate(MockSessionRefresher::new()), &pair, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Keep);

        let current = allowed(outcome);
        assert!(current.is_logged_in());
        assert_eq!(current.user().map(|p| p.id.as_str()), Some("u1"));
    }

    #[tokio::test]
    async fn test_bad_signature_clears_cookies() {
        let data = payload("s1", future_ms(), "u1");
        let pair = SessionCookiePair::new(data, "deadbeef");

        let outcome = run(&gate(MockSessionRefresher::new()), &pair, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_malformed_payload_clears_cookies() {
        let pair = signed("{not json");

        let outcome = run(&gate(MockSessionRefresher::new()), &pair, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert_eq!(allowed(outcome), CurrentUser::anonymous());
    }

    #[tokio::test]
    async fn test_no_cookies_is_anonymous_without_clearing() {
        let gate = gate(MockSessionRefresher::new());
        let outcome = gate.authenticate(None, None, "/").await;

        assert_eq!(outcome.cookies, CookieUpdate::Keep);
        assert_eq!(allowed(outcome), CurrentUser::anonymous());
    }

    #[tokio::test]
    async fn test_single_cookie_clears_both() {
        let gate = gate(MockSessionRefresher::new());
        let outcome = gate.authenticate(Some("data"), None, "/").await;

        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_missing_secret_is_anonymous() {
        let data = payload("s1", future_ms(), "u1");
        let pair = SessionCookiePair::signed(data, &"".into());
        let gate = AccessGate::<RemoteProfile>::new(
            GateConfig::new("app-1", ""),
            MockSessionRefresher::new(),
            UserResolver::new(),
        );

        let outcome = run(&gate, &pair, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed() {
        let expired = signed(&payload("s1", past_ms(), "u1"));
        let fresh = signed(&payload("s1", future_ms(), "u1-renewed"));
        let refresher = MockSessionRefresher::succeeding(fresh.clone());

        let outcome = run(&gate(refresher.clone()), &expired, "/").await;

        assert_eq!(refresher.calls(), vec!["s1".to_owned()]);
        assert_eq!(outcome.cookies, CookieUpdate::Install(fresh));
        let current = allowed(outcome);
        assert_eq!(current.user().map(|p| p.id.as_str()), Some("u1-renewed"));
    }

    #[tokio::test]
    async fn test_refreshed_session_is_not_refreshed_again() {
        let expired = signed(&payload("s1", past_ms(), "u1"));
        let fresh = signed(&payload("s1", future_ms(), "u1"));
        let refresher = MockSessionRefresher::succeeding(fresh.clone());
        let gate = gate(refresher.clone());

        let first = run(&gate, &expired, "/").await;
        let CookieUpdate::Install(installed) = first.cookies else {
            panic!("expected refreshed cookies");
        };

        let second = run(&gate, &installed, "/").await;
        assert_eq!(second.cookies, CookieUpdate::Keep);
        assert_eq!(refresher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_cookies() {
        let expired = signed(&payload("s1", past_ms(), "u1"));
        let refresher =
            MockSessionRefresher::failing(GateError::RefreshTransport("status 500".to_owned()));

        let outcome = run(&gate(refresher.clone()), &expired, "/").await;

        assert_eq!(refresher.calls(), vec!["s1".to_owned()]);
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_refreshed_pair_with_bad_signature_is_rejected() {
        let expired = signed(&payload("s1", past_ms(), "u1"));
        let forged = SessionCookiePair::new(payload("s1", future_ms(), "u1"), "deadbeef");

        let outcome = run(
            &gate(MockSessionRefresher::succeeding(forged)),
            &expired,
            "/",
        )
        .await;

        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_refresh_timeout_clears_cookies() {
        let expired = signed(&payload("s1", past_ms(), "u1"));
        let fresh = signed(&payload("s1", future_ms(), "u1"));
        let refresher =
            MockSessionRefresher::succeeding(fresh).with_delay(Duration::from_secs(5));
        let gate = AccessGate::<RemoteProfile>::new(
            config().with_refresh_timeout(Duration::from_millis(20)),
            refresher,
            UserResolver::new(),
        );

        let outcome = run(&gate, &expired, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_protected_path_denies_anonymous() {
        let gate = AccessGate::<RemoteProfile>::new(
            config().with_protected_path("/admin"),
            MockSessionRefresher::new(),
            UserResolver::new(),
        );

        let outcome = gate.authenticate(None, None, "/admin/x").await;
        match outcome.decision {
            Decision::Deny { login_page } => {
                assert!(login_page.contains("<a class=\"ub-login-form\"></a>"));
                assert!(login_page.contains("loginRedirectUrl:'/admin/x'"));
            }
            Decision::Allow(_) => panic!("expected a denial"),
        }
    }

    #[tokio::test]
    async fn test_protected_path_denies_after_failed_session() {
        let gate = AccessGate::<RemoteProfile>::new(
            config().with_protected_path("/admin"),
            MockSessionRefresher::new(),
            UserResolver::new(),
        );
        let pair = SessionCookiePair::new(payload("s1", future_ms(), "u1"), "deadbeef");

        let outcome = run(&gate, &pair, "/admin").await;
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(matches!(outcome.decision, Decision::Deny { .. }));
    }

    #[tokio::test]
    async fn test_protected_path_allows_signed_in_user() {
        let gate = AccessGate::<RemoteProfile>::new(
            config().with_protected_path("/admin"),
            MockSessionRefresher::new(),
            UserResolver::new(),
        );
        let pair = signed(&payload("s1", future_ms(), "u1"));

        let outcome = run(&gate, &pair, "/admin/x").await;
        assert!(allowed(outcome).is_logged_in());
    }

    #[tokio::test]
    async fn test_unprotected_path_allows_anonymous() {
        let gate = AccessGate::<RemoteProfile>::new(
            config().with_protected_path("/admin"),
            MockSessionRefresher::new(),
            UserResolver::new(),
        );

        let outcome = gate.authenticate(None, None, "/about").await;
        assert_eq!(allowed(outcome), CurrentUser::anonymous());
    }

    #[derive(Debug, Clone, PartialEq)]
    struct AppUser {
        id: String,
        created: bool,
    }

    impl From<RemoteProfile> for AppUser {
        fn from(profile: RemoteProfile) -> Self {
            Self {
                id: profile.id,
                created: false,
            }
        }
    }

    #[tokio::test]
    async fn test_created_user_is_attached() {
        let resolver = UserResolver::<AppUser>::new()
            .with_find_user(|_id: String| async { None::<AppUser> })
            .with_create_user(|profile: RemoteProfile| async move {
                Some(AppUser {
                    id: format!("local-{}", profile.id),
                    created: true,
                })
            });
        let gate = AccessGate::new(config(), MockSessionRefresher::new(), resolver);
        let pair = signed(&payload("s1", future_ms(), "u1"));

        let current = allowed(run(&gate, &pair, "/").await);
        assert_eq!(
            current.into_inner(),
            Some(AppUser {
                id: "local-u1".to_owned(),
                created: true,
            })
        );
    }

    #[tokio::test]
    async fn test_unresolvable_user_is_anonymous_and_keeps_cookies() {
        let resolver =
            UserResolver::<AppUser>::new().with_find_user(|_id: String| async { None::<AppUser> });
        let gate = AccessGate::new(
            config().with_protected_path("/admin"),
            MockSessionRefresher::new(),
            resolver,
        );
        let pair = signed(&payload("s1", future_ms(), "u1"));

        let outcome = run(&gate, &pair, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Keep);
        assert_eq!(allowed(outcome), CurrentUser::anonymous());

        let outcome = run(&gate, &pair, "/admin").await;
        assert!(matches!(outcome.decision, Decision::Deny { .. }));
    }

    #[tokio::test]
    async fn test_hook_timeout_clears_cookies() {
        let resolver = UserResolver::<AppUser>::new().with_find_user(|_id: String| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            None::<AppUser>
        });
        let gate = AccessGate::new(
            config().with_resolve_timeout(Duration::from_millis(20)),
            MockSessionRefresher::new(),
            resolver,
        );
        let pair = signed(&payload("s1", future_ms(), "u1"));

        let outcome = run(&gate, &pair, "/").await;
        assert_eq!(outcome.cookies, CookieUpdate::Clear);
        assert!(!allowed(outcome).is_logged_in());
    }

    #[test]
    fn test_current_user_from_option() {
        let signed_in = CurrentUser::from(Some(1));
        assert!(signed_in.is_logged_in());
        assert_eq!(signed_in.user(), Some(&1));

        let anonymous = CurrentUser::<i32>::from(None);
        assert!(!anonymous.is_logged_in());
        assert_eq!(anonymous.into_inner(), None);
    }
}
