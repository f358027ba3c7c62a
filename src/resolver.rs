//! Mapping a Userbin profile onto the host application's user.
//!
//! The host plugs in two optional hooks:
//!
//! - [`FindUser`] looks a user up by the remote profile id.
//! - [`CreateUser`] creates one when the lookup comes back empty.
//!
//! Both are implemented for async closures, so most hosts never write an impl:
//!
//! ```rust,ignore
//! let resolver = UserResolver::<AppUser>::new()
//!     .with_find_user(move |id: String| {
//!         let db = db.clone();
//!         async move { db.user_by_userbin_id(&id).await.ok().flatten() }
//!     })
//!     .with_create_user(|profile: RemoteProfile| async move {
//!         Some(AppUser::from(profile))
//!     });
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_TIMEOUT;
use crate::events::{GateEvent, dispatch};
use crate::{GateError, RemoteProfile};

/// Bounds every user type the gate can attach to a request.
///
/// `From<RemoteProfile>` lets the profile stand in for the user when no
/// lookup hook is configured, or when `create_user` yields nothing.
pub trait LocalUser: From<RemoteProfile> + Clone + Send + Sync + 'static {}

impl<T> LocalUser for T where T: From<RemoteProfile> + Clone + Send + Sync + 'static {}

/// Result of a [`FindUser`] lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<U> {
    Found(U),
    NotFound,
}

impl<U> From<Option<U>> for Lookup<U> {
    fn from(user: Option<U>) -> Self {
        user.map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Looks up a local user by remote profile id.
#[async_trait]
pub trait FindUser<U>: Send + Sync {
    async fn find_user(&self, id: &str) -> Lookup<U>;
}

/// Creates a local user for a profile seen for the first time.
///
/// Returning `None` makes the resolver fall back to the profile itself.
#[async_trait]
pub trait CreateUser<U>: Send + Sync {
    async fn create_user(&self, profile: &RemoteProfile) -> Option<U>;
}

#[async_trait]
impl<U, F, Fut> FindUser<U> for F
where
    U: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Option<U>> + Send + 'static,
{
    async fn find_user(&self, id: &str) -> Lookup<U> {
        self(id.to_owned()).await.into()
    }
}

#[async_trait]
impl<U, F, Fut> CreateUser<U> for F
where
    U: Send + 'static,
    F: Fn(RemoteProfile) -> Fut + Send + Sync,
    Fut: Future<Output = Option<U>> + Send + 'static,
{
    async fn create_user(&self, profile: &RemoteProfile) -> Option<U> {
        self(profile.clone()).await
    }
}

/// Runs the find-then-create sequence for a profile.
pub struct UserResolver<U> {
    find_user: Option<Arc<dyn FindUser<U>>>,
    create_user: Option<Arc<dyn CreateUser<U>>>,
    pub(crate) timeout: Duration,
}

impl<U> Clone for UserResolver<U> {
    fn clone(&self) -> Self {
        Self {
            find_user: self.find_user.clone(),
            create_user: self.create_user.clone(),
            timeout: self.timeout,
        }
    }
}

impl<U> std::fmt::Debug for UserResolver<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserResolver")
            .field("find_user", &self.find_user.is_some())
            .field("create_user", &self.create_user.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<U: LocalUser> Default for UserResolver<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: LocalUser> UserResolver<U> {
    /// A resolver with no hooks: every profile is accepted as the user.
    pub fn new() -> Self {
        Self {
            find_user: None,
            create_user: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_find_user(mut self, hook: impl FindUser<U> + 'static) -> Self {
        self.find_user = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn with_create_user(mut self, hook: impl CreateUser<U> + 'static) -> Self {
        self.create_user = Some(Arc::new(hook));
        self
    }

    /// Bounds each hook call. [`AccessGate`](crate::AccessGate) overrides this
    /// with the configured `resolve_timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_find_user(&self) -> bool {
        self.find_user.is_some()
    }

    pub fn has_create_user(&self) -> bool {
        self.create_user.is_some()
    }

    /// Resolves a profile into a local user.
    ///
    /// # Errors
    ///
    /// - `GateError::UnresolvableUser` if `find_user` found nothing and there
    ///   is no `create_user` hook.
    /// - `GateError::Timeout` if a hook outlived the timeout.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resolve_user", skip_all, fields(profile_id = %profile.id), err)
    )]
    pub async fn resolve(&self, profile: RemoteProfile) -> Result<U, GateError> {
        let Some(find_user) = &self.find_user else {
            return Ok(U::from(profile));
        };

        if let Lookup::Found(user) = bounded(self.timeout, find_user.find_user(&profile.id)).await? {
            return Ok(user);
        }

        let Some(create_user) = &self.create_user else {
            log::error!(
                target: "userbin",
                "msg=\"findUser returned no user and no createUser hook is configured\" profile_id=\"{}\"",
                profile.id
            );
            return Err(GateError::UnresolvableUser);
        };

        match bounded(self.timeout, create_user.create_user(&profile)).await? {
            Some(user) => {
                dispatch(GateEvent::UserCreated {
                    profile_id: profile.id.clone(),
                    at: chrono::Utc::now(),
                })
                .await;
                Ok(user)
            }
            None => Ok(U::from(profile)),
        }
    }
}

async fn bounded<T>(limit: Duration, fut: impl Future<Output = T>) -> Result<T, GateError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| GateError::Timeout)
}
