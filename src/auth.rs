use crate::api::Api;
use crate::error::Error;
use leptos::logging::warn;
use leptos::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

pub const TOKEN_KEY: &str = "pony-express.token";

/// Durable home of the bearer token across page loads.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, Error>;
    fn save(&self, token: &str) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

/// `window.localStorage`, under [`TOKEN_KEY`].
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, Error> {
        let storage = window()
            .local_storage()
            .map_err(|err| Error::Storage(format!("{err:?}")))?
            .ok_or_else(|| Error::Storage("local storage is disabled".to_owned()))?;
        Ok(Self { storage })
    }
}

impl TokenStore for LocalStorage {
    fn load(&self) -> Result<Option<String>, Error> {
        self.storage
            .get_item(TOKEN_KEY)
            .map_err(|err| Error::Storage(format!("{err:?}")))
    }

    fn save(&self, token: &str) -> Result<(), Error> {
        self.storage
            .set_item(TOKEN_KEY, token)
            .map_err(|err| Error::Storage(format!("{err:?}")))
    }

    fn clear(&self) -> Result<(), Error> {
        self.storage
            .remove_item(TOKEN_KEY)
            .map_err(|err| Error::Storage(format!("{err:?}")))
    }
}

/// Keeps the token for the lifetime of the page only. Used when local storage
/// is unavailable (private browsing, storage disabled).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Rc<RefCell<Option<String>>>);

impl TokenStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, Error> {
        Ok(self.0.borrow().clone())
    }

    fn save(&self, token: &str) -> Result<(), Error> {
        *self.0.borrow_mut() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.0.borrow_mut() = None;
        Ok(())
    }
}

/// Logged out (no token) or logged in (non-empty token).
pub struct Session {
    store: Rc<dyn TokenStore>,
    token: Option<String>,
}

impl Session {
    /// Starts from whatever the store remembers. An unreadable store starts
    /// logged out.
    pub fn restore(store: Rc<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                warn!("Could not read the stored token: {err}");
                None
            }
        };
        Self { store, token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[cfg(test)]
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// The session is logged in even when persisting fails; the error only
    /// means the next page load will start logged out. An empty token logs
    /// out.
    pub fn login(&mut self, token: impl Into<String>) -> Result<(), Error> {
        let token = token.into();
        if token.is_empty() {
            return self.logout();
        }
        let saved = self.store.save(&token);
        self.token = Some(token);
        saved
    }

    pub fn logout(&mut self) -> Result<(), Error> {
        self.token = None;
        self.store.clear()
    }
}

/// Reactive handle on the [`Session`], provided once at the root.
#[derive(Clone)]
pub struct Auth {
    session: Rc<RefCell<Session>>,
    token: RwSignal<Option<String>>,
}

impl Auth {
    pub fn new(session: Session) -> Self {
        let token = create_rw_signal(session.token().map(str::to_owned));
        Self {
            session: Rc::new(RefCell::new(session)),
            token,
        }
    }

    pub fn token_untracked(&self) -> Option<String> {
        self.token.get_untracked()
    }

    pub fn token_signal(&self) -> Signal<Option<String>> {
        self.token.into()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.with(Option::is_some)
    }

    /// The session borrow ends before subscribers run, since they may log
    /// out again.
    pub fn login(&self, token: impl Into<String>) {
        let token = {
            let mut session = self.session.borrow_mut();
            if let Err(err) = session.login(token) {
                warn!("Token kept for this page only: {err}");
            }
            session.token().map(str::to_owned)
        };
        self.token.set(token);
    }

    pub fn logout(&self) {
        if let Err(err) = self.session.borrow_mut().logout() {
            warn!("Could not forget the stored token: {err}");
        }
        self.token.set(None);
    }
}

pub fn provide_auth(session: Session) -> Auth {
    let auth = Auth::new(session);
    provide_context(auth.clone());
    auth
}

pub fn use_auth() -> Auth {
    expect_context::<Auth>()
}

/// Binds the tokenless [`Api`] provided at the root to whatever token is
/// current when the returned closure runs. Call at component setup; the
/// closure is safe to use from event handlers and tasks.
pub fn use_api() -> impl Fn() -> Api + Clone + 'static {
    let api = expect_context::<Api>();
    let auth = use_auth();
    move || api.with_token(auth.token_untracked())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Exchanges credentials for a bearer token at the token endpoint.
pub async fn request_token(api: &Api, username: &str, password: &str) -> Result<String, Error> {
    let response = api
        .post_form("/auth/token", &[("username", username), ("password", password)])
        .await?
        .error_for_status()?;
    let token: TokenResponse = response.json()?;
    if let Some(kind) = token.token_type.filter(|kind| !kind.eq_ignore_ascii_case("bearer")) {
        warn!("Unexpected token type {kind}, using it as a bearer token");
    }
    Ok(token.access_token)
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

pub async fn register(api: &Api, registration: &Registration<'_>) -> Result<(), Error> {
    api.post("/auth/registration", registration)
        .await?
        .error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FORM;
    use crate::config::Config;
    use crate::testing::Recorder;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use reqwest::Method;
    use serde_json::json;

    struct BrokenStore;

    impl TokenStore for BrokenStore {
        fn load(&self) -> Result<Option<String>, Error> {
            Err(Error::Storage("quota".to_owned()))
        }
        fn save(&self, _token: &str) -> Result<(), Error> {
            Err(Error::Storage("quota".to_owned()))
        }
        fn clear(&self) -> Result<(), Error> {
            Err(Error::Storage("quota".to_owned()))
        }
    }

    #[test]
    fn logout_survives_a_reload() {
        let store = MemoryStore::default();
        let mut session = Session::restore(Rc::new(store.clone()));
        assert!(!session.is_logged_in());

        session.login("abc").unwrap();
        assert_eq!(session.token(), Some("abc"));
        let reloaded = Session::restore(Rc::new(store.clone()));
        assert_eq!(reloaded.token(), Some("abc"));

        session.logout().unwrap();
        let reloaded = Session::restore(Rc::new(store));
        assert!(!reloaded.is_logged_in());
    }

    #[test]
    fn empty_token_is_logged_out() {
        let store = MemoryStore::default();
        store.save("").unwrap();
        let mut session = Session::restore(Rc::new(store.clone()));
        assert!(!session.is_logged_in());

        session.login("abc").unwrap();
        session.login("").unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn broken_storage_still_logs_in() {
        let mut session = Session::restore(Rc::new(BrokenStore));
        assert!(!session.is_logged_in());
        assert!(session.login("abc").is_err());
        assert_eq!(session.token(), Some("abc"));
        assert!(session.logout().is_err());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn auth_context_tracks_the_session() {
        let runtime = create_runtime();
        let store = MemoryStore::default();
        let auth = Auth::new(Session::restore(Rc::new(store.clone())));
        assert!(!auth.is_logged_in());

        auth.login("abc");
        assert_eq!(auth.token_untracked(), Some("abc".to_owned()));
        assert_eq!(store.load().unwrap(), Some("abc".to_owned()));

        auth.logout();
        assert!(!auth.is_logged_in());
        assert_eq!(store.load().unwrap(), None);
        runtime.dispose();
    }

    #[tokio::test]
    async fn token_endpoint_takes_a_form() {
        let recorder = Rc::new(Recorder::default());
        recorder.respond(
            Method::POST,
            "/auth/token",
            200,
            r#"{"access_token": "abc", "token_type": "bearer"}"#,
        );
        let api = Api::new(Rc::new(Config::default()), None, recorder.clone());

        let token = request_token(&api, "pony", "hunter2").await.unwrap();
        assert_eq!(token, "abc");
        let request = recorder.last().unwrap();
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), FORM);
        assert!(request.headers.get(AUTHORIZATION).is_none());
        assert_eq!(request.body_text(), "username=pony&password=hunter2");
    }

    #[tokio::test]
    async fn rejected_credentials() {
        let recorder = Rc::new(Recorder::default());
        recorder.respond(Method::POST, "/auth/token", 401, r#"{"detail": "nope"}"#);
        let api = Api::new(Rc::new(Config::default()), None, recorder.clone());

        let err = request_token(&api, "pony", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn registration_posts_json() {
        let recorder = Rc::new(Recorder::default());
        let api = Api::new(Rc::new(Config::default()), None, recorder.clone());
        let registration = Registration {
            username: "pony",
            email: "pony@example.com",
            password: "hunter2",
        };
        register(&api, &registration).await.unwrap();

        let request = recorder.last().unwrap();
        assert_eq!(request.path, "/auth/registration");
        assert_eq!(
            request.body_json(),
            json!({"username": "pony", "email": "pony@example.com", "password": "hunter2"})
        );
    }
}
