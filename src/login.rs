use crate::auth::{register, request_token, use_api, use_auth, Registration as NewAccount};
use crate::error::Error;
use crate::loading::Failure;
use crate::routes;
use crate::task::use_task_scope;
use leptos::ev::SubmitEvent;
use leptos::logging::error;
use leptos::*;
use leptos_router::A;

const INPUT: &str = "block w-full p-2.5 text-sm text-gray-900 bg-gray-50 rounded-lg border border-gray-300 focus:ring-blue-500 focus:border-blue-500 dark:bg-gray-700 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white";
const SUBMIT: &str = "text-white bg-blue-700 hover:bg-blue-800 focus:ring-4 focus:outline-none focus:ring-blue-300 font-medium rounded-lg text-sm px-5 py-2.5 text-center dark:bg-blue-600 dark:hover:bg-blue-700 dark:focus:ring-blue-800 disabled:cursor-not-allowed";

fn explain(err: &Error) -> String {
    if err.is_unauthorized() {
        "Wrong username or password".to_owned()
    } else {
        err.to_string()
    }
}

#[component]
fn Field(
    label: &'static str,
    kind: &'static str,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <label class="flex flex-col gap-1 text-sm font-medium text-gray-900 dark:text-white">
            {label}
            <input
                type=kind
                class=INPUT
                required
                prop:value=value
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        </label>
    }
}

#[component]
pub fn Login() -> impl IntoView {
    let auth = use_auth();
    let api = use_api();
    let scope = use_task_scope();
    let username = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let failure = create_rw_signal(None::<String>);
    let pending = create_rw_signal(false);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let (api, auth) = (api(), auth.clone());
        let (username, password) = (username.get_untracked(), password.get_untracked());
        pending.set(true);
        scope.spawn(async move {
            let result = request_token(&api, &username, &password).await;
            pending.set(false);
            match result {
                // Logging in swaps this form out for the chats.
                Ok(token) => auth.login(token),
                Err(err) => {
                    error!("Login failed: {err}");
                    failure.set(Some(explain(&err)));
                }
            }
        });
    };

    view! {
        <div class="flex items-center justify-center w-full h-full dark:bg-gray-800">
            <form class="flex flex-col gap-4 w-80" on:submit=submit>
                <h2 class="text-2xl font-bold dark:text-white">login</h2>
                <Field label="Username" kind="text" value=username />
                <Field label="Password" kind="password" value=password />
                {move || failure.get().map(|message| view! { <Failure message /> })}
                <button type="submit" class=SUBMIT disabled=move || pending.get()>
                    {move || if pending.get() { "Logging in..." } else { "Login" }}
                </button>
                <A href=routes::REGISTRATION class="text-sm text-blue-600 dark:text-blue-500">
                    "No account yet? Register"
                </A>
            </form>
        </div>
    }
}

#[component]
pub fn Registration() -> impl IntoView {
    let auth = use_auth();
    let api = use_api();
    let scope = use_task_scope();
    let username = create_rw_signal(String::new());
    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let failure = create_rw_signal(None::<String>);
    let pending = create_rw_signal(false);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let (api, auth) = (api(), auth.clone());
        let (username, email, password) = (
            username.get_untracked(),
            email.get_untracked(),
            password.get_untracked(),
        );
        pending.set(true);
        scope.spawn(async move {
            let registration = NewAccount {
                username: &username,
                email: &email,
                password: &password,
            };
            let result = match register(&api, &registration).await {
                Ok(()) => request_token(&api, &username, &password).await,
                Err(err) => Err(err),
            };
            pending.set(false);
            match result {
                Ok(token) => auth.login(token),
                Err(err) => {
                    error!("Registration failed: {err}");
                    failure.set(Some(err.to_string()));
                }
            }
        });
    };

    view! {
        <div class="flex items-center justify-center w-full h-full dark:bg-gray-800">
            <form class="flex flex-col gap-4 w-80" on:submit=submit>
                <h2 class="text-2xl font-bold dark:text-white">register</h2>
                <Field label="Username" kind="text" value=username />
                <Field label="Email" kind="email" value=email />
                <Field label="Password" kind="password" value=password />
                {move || failure.get().map(|message| view! { <Failure message /> })}
                <button type="submit" class=SUBMIT disabled=move || pending.get()>
                    "Create account"
                </button>
                <A href=routes::LOGIN class="text-sm text-blue-600 dark:text-blue-500">
                    "Already registered? Login"
                </A>
            </form>
        </div>
    }
}
