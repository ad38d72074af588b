use crate::auth::use_auth;
use crate::loading::Loading;
use crate::message::format_day;
use crate::state::User;
use crate::user::use_user;
use leptos::ev::SubmitEvent;
use leptos::logging::log;
use leptos::*;

/// Local edits of the profile form. There is no backend endpoint to update a
/// user, so saving only closes the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    pub username: String,
    pub email: String,
    pub read_only: bool,
}

impl ProfileDraft {
    pub fn from_user(user: Option<&User>) -> Self {
        Self {
            username: user.map(|user| user.username.clone()).unwrap_or_default(),
            email: user.map(|user| user.email.clone()).unwrap_or_default(),
            read_only: true,
        }
    }

    /// Flips between reading and editing, discarding unsaved edits.
    pub fn toggle(&mut self, user: Option<&User>) {
        let read_only = !self.read_only;
        *self = Self::from_user(user);
        self.read_only = read_only;
    }

    pub fn submit(&mut self) {
        self.read_only = true;
    }
}

#[component]
pub fn Profile() -> impl IntoView {
    let auth = use_auth();
    let user = use_user();
    let draft = create_rw_signal(ProfileDraft::from_user(None));

    create_effect(move |_| {
        let user = user.get();
        draft.set(ProfileDraft::from_user(user.as_ref()));
    });

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        draft.update(|draft| {
            log!("username: {}, email: {}", draft.username, draft.email);
            draft.submit();
        });
    };
    let toggle = move |_| {
        let user = user.get_untracked();
        draft.update(|draft| draft.toggle(user.as_ref()));
    };
    let logout = move |_| auth.logout();

    let field = move |label: &'static str, read: fn(&ProfileDraft) -> String, write: fn(&mut ProfileDraft, String)| {
        view! {
            <div class="flex items-center mb-4">
                <label class="text-gray-400 mr-2">{label}</label>
                {move || {
                    if draft.with(|draft| draft.read_only) {
                        view! { <span class="text-gray-200">{move || draft.with(read)}</span> }
                            .into_view()
                    } else {
                        view! {
                            <input
                                type="text"
                                class="p-2 rounded bg-gray-200 text-gray-800"
                                prop:value=move || draft.with(read)
                                on:input=move |ev| {
                                    let value = event_target_value(&ev);
                                    draft.update(|draft| write(draft, value));
                                }
                            />
                        }
                            .into_view()
                    }
                }}
            </div>
        }
    };

    view! {
        <div class="max-w-96 mx-auto px-4 py-8 dark:text-white">
            <h2 class="text-2xl font-bold py-2">details</h2>
            <Show when=move || user.get().is_some() fallback=|| view! { <Loading /> }>
                <form class="border rounded px-4 py-2" on:submit=submit>
                    {field("Username:", |draft| draft.username.clone(), |draft, value| draft.username = value)}
                    {field("Email:", |draft| draft.email.clone(), |draft, value| draft.email = value)}
                    <div class="flex items-center mb-4">
                        <label class="text-gray-400 mr-2">"Member Since:"</label>
                        <span class="text-gray-200">
                            {move || user.get().map(|user| format_day(&user.created_at))}
                        </span>
                    </div>
                    <Show when=move || !draft.with(|draft| draft.read_only)>
                        <button type="submit" class="px-2 py-1 mr-2 rounded bg-green-500 text-white font-semibold">
                            Save
                        </button>
                    </Show>
                    <button type="button" class="px-2 py-1 rounded bg-gray-500 text-white font-semibold" on:click=toggle>
                        {move || if draft.with(|draft| draft.read_only) { "Edit" } else { "Cancel" }}
                    </button>
                </form>
            </Show>
            <button
                type="button"
                class="mt-4 text-white bg-gray-800 hover:bg-gray-900 font-medium rounded-lg text-sm px-5 py-2.5 dark:bg-gray-800 dark:hover:bg-gray-700"
                on:click=logout
            >
                logout
            </button>
        </div>
    }
}
