use crate::api::Api;
use crate::auth::Auth;
use crate::error::Error;
use crate::state::User;
use leptos::logging::error;
use leptos::*;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum UserPayload {
    Wrapped { user: User },
    Bare(User),
}

pub async fn fetch_current_user(api: &Api) -> Result<User, Error> {
    let response = api.get("/users/me").await?.error_for_status()?;
    Ok(match response.json::<UserPayload>()? {
        UserPayload::Wrapped { user } | UserPayload::Bare(user) => user,
    })
}

/// `Ok(None)` without touching the network when there is no token.
pub async fn load_current_user(api: &Api) -> Result<Option<User>, Error> {
    if api.token().is_none() {
        return Ok(None);
    }
    fetch_current_user(api).await.map(Some)
}

/// The signed in user, `None` while logged out or still loading.
#[derive(Clone, Copy)]
pub struct CurrentUser(Resource<Option<String>, Option<User>>);

impl CurrentUser {
    pub fn get(&self) -> Option<User> {
        self.0.get().flatten()
    }

    pub fn get_untracked(&self) -> Option<User> {
        untrack(|| self.0.get()).flatten()
    }
}

/// One fetch per token: the resource is keyed on the token, so a new login
/// fetches again and logging out fetches nothing. A token the backend no
/// longer accepts logs the session out.
pub fn provide_user(auth: &Auth, api: Api) -> CurrentUser {
    let token = auth.token_signal();
    let on_rejected = auth.clone();
    let resource = create_local_resource(
        move || token.get(),
        move |token| {
            let api = api.with_token(token);
            let auth = on_rejected.clone();
            async move {
                match load_current_user(&api).await {
                    Ok(user) => user,
                    Err(err) => {
                        error!("Could not load the current user: {err}");
                        if err.is_unauthorized() {
                            auth.logout();
                        }
                        None
                    }
                }
            }
        },
    );
    let user = CurrentUser(resource);
    provide_context(user);
    user
}

pub fn use_user() -> CurrentUser {
    expect_context::<CurrentUser>()
}
