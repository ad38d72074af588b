use crate::api::Api;
use crate::auth::{provide_auth, use_auth, LocalStorage, MemoryStore, Session, TokenStore};
use crate::config::{Config, DEFAULT_API_URL};
use crate::conversation::Chats;
use crate::login::{Login, Registration};
use crate::nav::TopNav;
use crate::profile::Profile;
use crate::query::provide_query_client;
use crate::routes;
use crate::user::provide_user;
use leptos::logging::{error, warn};
use leptos::*;
use leptos_router::*;
use std::rc::Rc;

fn token_store() -> Rc<dyn TokenStore> {
    match LocalStorage::open() {
        Ok(storage) => Rc::new(storage),
        Err(err) => {
            warn!("{err}, the session will not survive a reload");
            Rc::new(MemoryStore::default())
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = Config::from_env().unwrap_or_else(|err| {
        error!("{err}, falling back to {DEFAULT_API_URL}");
        Config::default()
    });
    let api = Api::connect(Rc::new(config), None);
    provide_context(api.clone());

    let auth = provide_auth(Session::restore(token_store()));
    let client = provide_query_client();
    provide_user(&auth, api);

    // Cached payloads belong to whoever was signed in when they were fetched.
    let token = auth.token_signal();
    create_effect(move |previous: Option<Option<String>>| {
        let current = token.get();
        if previous.is_some_and(|previous| previous != current) {
            client.clear();
        }
        current
    });

    view! {
        <Router>
            <div class="h-dvh max-h-dvh flex flex-col dark:bg-gray-900">
                <header>
                    <TopNav />
                </header>
                <main class="grow flex flex-col overflow-hidden">
                    <Routes>
                        <Route
                            path=routes::HOME
                            view=|| view! { <Gate route=routes::HOME><Home /></Gate> }
                        />
                        <Route
                            path=routes::CHATS
                            view=|| view! { <Gate route=routes::CHATS><Chats /></Gate> }
                        />
                        <Route
                            path=routes::CHAT
                            view=|| view! { <Gate route=routes::CHAT><Chats /></Gate> }
                        />
                        <Route
                            path=routes::PROFILE
                            view=|| view! { <Gate route=routes::PROFILE><Profile /></Gate> }
                        />
                        <Route
                            path=routes::LOGIN
                            view=|| view! { <Gate route=routes::LOGIN><Login /></Gate> }
                        />
                        <Route
                            path=routes::REGISTRATION
                            view=|| view! { <Gate route=routes::REGISTRATION><Registration /></Gate> }
                        />
                        <Route
                            path=routes::NOT_FOUND
                            view=|| view! { <Gate route=routes::NOT_FOUND><NotFound /></Gate> }
                        />
                        <Route path=routes::ANY view=Fallback />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}

/// Renders `children` only for sessions allowed on `route`, redirects the
/// others.
#[component]
fn Gate(route: &'static str, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let access = routes::access(route);
    move || match routes::redirect(access, auth.is_logged_in()) {
        Some(path) => view! { <Redirect path /> }.into_view(),
        None => children().into_view(),
    }
}

#[component]
fn Fallback() -> impl IntoView {
    let auth = use_auth();
    move || view! { <Redirect path=routes::fallback(auth.is_logged_in()) /> }
}

#[component]
fn Home() -> impl IntoView {
    view! {
        <div class="max-w-4/5 mx-auto text-center px-4 py-8 dark:text-white">
            <div class="py-2">
                "This is the pony express messaging application. Send messages to people in chats."
            </div>
            <A
                href=routes::REGISTRATION
                class="inline-block text-white bg-blue-700 hover:bg-blue-800 font-medium rounded-lg text-sm px-5 py-2.5 dark:bg-blue-600 dark:hover:bg-blue-700"
            >
                "Get started"
            </A>
        </div>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! { <h1 class="p-8 text-center text-2xl dark:text-white">"404: not found"</h1> }
}
