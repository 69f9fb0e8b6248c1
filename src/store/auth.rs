use crate::models::user::{ SessionUser, User };
use crate::storage::AuthRepository;
use serde::{ Serialize, Deserialize };
use std::error::Error;
use std::sync::Arc;

/// The full persisted credential document: every registered user plus the
/// current session flag. This is the exact shape written to storage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthState {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    pub user: Option<SessionUser>,
    pub users: Vec<User>,
}

impl AuthState {
    /// Appends a new user record. Fails without mutating when the email is
    /// already taken; usernames are not checked for uniqueness.
    pub fn register(&mut self, username: &str, email: &str, password: &str) -> bool {
        if self.users.iter().any(|u| u.email == email) {
            return false;
        }
        self.users.push(User {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        true
    }

    /// Succeeds iff a stored record matches both email and password exactly
    /// (case-sensitive, no normalization). On failure the session state is
    /// left untouched.
    pub fn login(&mut self, email: &str, password: &str) -> bool {
        match self.users.iter().find(|u| u.email == email && u.password == password) {
            Some(user) => {
                self.user = Some(SessionUser::from(user));
                self.is_authenticated = true;
                true
            }
            None => false,
        }
    }

    /// Resets the session to unauthenticated. User records are untouched.
    pub fn logout(&mut self) {
        self.is_authenticated = false;
        self.user = None;
    }
}

/// Adapter that pairs the pure `AuthState` transitions with a repository:
/// state is rehydrated once at open and saved after every mutation that
/// actually changed something.
pub struct CredentialStore {
    state: AuthState,
    repository: Arc<dyn AuthRepository>,
}

impl CredentialStore {
    pub async fn open(
        repository: Arc<dyn AuthRepository>
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let state = repository.load().await?;
        Ok(Self { state, repository })
    }

    /// Registers a new user and persists on success. The boolean is the
    /// registration outcome; the error channel carries storage failures only.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let registered = self.state.register(username, email, password);
        if registered {
            self.repository.save(&self.state).await?;
        }
        Ok(registered)
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let authenticated = self.state.login(email, password);
        if authenticated {
            self.repository.save(&self.state).await?;
        }
        Ok(authenticated)
    }

    pub async fn logout(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.state.logout();
        self.repository.save(&self.state).await
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    pub fn current_user(&self) -> Option<&SessionUser> {
        self.state.user.as_ref()
    }

    pub fn users(&self) -> &[User] {
        &self.state.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryAuthRepository;

    #[test]
    fn register_rejects_duplicate_email() {
        let mut state = AuthState::default();
        assert!(state.register("alice", "a@x.com", "pw1"));
        assert!(!state.register("bob", "a@x.com", "pw2"));
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.users[0].username, "alice");
    }

    #[test]
    fn register_allows_duplicate_username() {
        let mut state = AuthState::default();
        assert!(state.register("alice", "a@x.com", "pw1"));
        assert!(state.register("alice", "b@x.com", "pw2"));
        assert_eq!(state.users.len(), 2);
    }

    #[test]
    fn login_requires_exact_match() {
        let mut state = AuthState::default();
        state.register("alice", "a@x.com", "pw1");

        assert!(!state.login("a@x.com", "wrong"));
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());

        assert!(!state.login("A@X.COM", "pw1"));
        assert!(!state.is_authenticated);

        assert!(state.login("a@x.com", "pw1"));
        assert!(state.is_authenticated);
        assert_eq!(
            state.user,
            Some(SessionUser {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
            })
        );
    }

    #[test]
    fn failed_login_keeps_prior_session() {
        let mut state = AuthState::default();
        state.register("alice", "a@x.com", "pw1");
        assert!(state.login("a@x.com", "pw1"));

        assert!(!state.login("nobody@x.com", "pw1"));
        assert!(state.is_authenticated);
        assert_eq!(state.user.as_ref().map(|u| u.username.as_str()), Some("alice"));
    }

    #[test]
    fn logout_always_clears_session() {
        let mut state = AuthState::default();
        state.logout();
        assert!(!state.is_authenticated);

        state.register("alice", "a@x.com", "pw1");
        state.login("a@x.com", "pw1");
        state.logout();
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert_eq!(state.users.len(), 1);
    }

    #[tokio::test]
    async fn store_persists_across_reopen() {
        let repository = Arc::new(MemoryAuthRepository::new());

        let mut store = CredentialStore::open(repository.clone()).await.unwrap();
        assert!(store.register("alice", "a@x.com", "pw1").await.unwrap());
        assert!(store.login("a@x.com", "pw1").await.unwrap());

        let reopened = CredentialStore::open(repository).await.unwrap();
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.users().len(), 1);
        assert_eq!(
            reopened.current_user().map(|u| u.email.as_str()),
            Some("a@x.com")
        );
    }

    #[tokio::test]
    async fn failed_register_does_not_save() {
        let repository = Arc::new(MemoryAuthRepository::new());
        let mut store = CredentialStore::open(repository.clone()).await.unwrap();
        store.register("alice", "a@x.com", "pw1").await.unwrap();

        assert!(!store.register("bob", "a@x.com", "pw2").await.unwrap());
        let reopened = CredentialStore::open(repository).await.unwrap();
        assert_eq!(reopened.users().len(), 1);
    }
}
