use crate::auth::use_api;
use crate::cache::QueryKey;
use crate::chats::{create_message, delete_message, list_messages, update_message};
use crate::error::Error;
use crate::loading::{Failure, Loading};
use crate::message::Message;
use crate::nav::ChatList;
use crate::query::{use_query, use_query_client};
use crate::state::{Id, User};
use crate::task::use_task_scope;
use crate::user::use_user;
use leptos::ev::SubmitEvent;
use leptos::logging::error;
use leptos::*;
use leptos_router::use_params_map;

/// Trimmed text worth sending, `None` when blank.
pub fn prepared(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

/// A failed load wins over a user that is still missing; `Ok(None)` keeps
/// the spinner.
pub fn feed_state<T>(messages: Result<T, Error>, me: Option<User>) -> Result<Option<(T, User)>, Error> {
    let messages = messages?;
    Ok(me.map(|me| (messages, me)))
}

/// `/chats` and `/chats/:chat_id`: the chat list next to the open chat.
#[component]
pub fn Chats() -> impl IntoView {
    let params = use_params_map();
    let chat_id = Signal::derive(move || params.with(|params| params.get("chat_id").cloned()));
    view! {
        <div class="flex flex-row h-full">
            <ChatList selected=chat_id />
            {move || match chat_id.get() {
                Some(chat_id) => view! { <Conversation chat_id /> }.into_view(),
                None => {
                    view! {
                        <h2 class="grow p-5 text-center text-gray-500 dark:text-gray-400">
                            "Select a chat"
                        </h2>
                    }
                        .into_view()
                }
            }}
        </div>
    }
}

#[component]
pub fn Conversation(chat_id: String) -> impl IntoView {
    let api = use_api();
    let client = use_query_client();
    let user = use_user();
    let scope = use_task_scope();

    let messages = use_query(
        {
            let chat_id = chat_id.clone();
            move || chat_id.clone()
        },
        |chat_id: &String| QueryKey::messages(chat_id),
        {
            let api = api.clone();
            move |chat_id: String| {
                let api = api();
                async move { list_messages(&api, &chat_id).await }
            }
        },
    );

    let (message, set_message) = create_signal(String::new());
    let (failure, set_failure) = create_signal(None::<String>);
    let editing = create_rw_signal(None::<Id>);
    let draft = create_rw_signal(String::new());

    let update_message_input = move |ev| {
        set_message.set(event_target_value(&ev));
    };

    let send_message = {
        let (api, client, scope, chat_id) = (api.clone(), client.clone(), scope.clone(), chat_id.clone());
        move |ev: SubmitEvent| {
            ev.prevent_default();
            let Some(text) = prepared(&message.get_untracked()).map(str::to_owned) else {
                return;
            };
            let (api, client, chat_id) = (api(), client.clone(), chat_id.clone());
            scope.spawn(async move {
                match create_message(&api, client.cache(), &chat_id, &text).await {
                    Ok(()) => {
                        set_message.set(String::new());
                        set_failure.set(None);
                    }
                    Err(err) => {
                        error!("Error creating message: {err}");
                        set_failure.set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let save = {
        let (api, client, scope, chat_id) = (api.clone(), client.clone(), scope.clone(), chat_id.clone());
        move || {
            let Some(message_id) = editing.get_untracked() else {
                return;
            };
            let Some(text) = prepared(&draft.get_untracked()).map(str::to_owned) else {
                return;
            };
            let (api, client, chat_id) = (api(), client.clone(), chat_id.clone());
            scope.spawn(async move {
                match update_message(&api, client.cache(), &chat_id, message_id.as_str(), &text)
                    .await
                {
                    Ok(()) => {
                        editing.set(None);
                        set_failure.set(None);
                    }
                    Err(err) => {
                        error!("Error updating message: {err}");
                        set_failure.set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let remove = {
        let (api, client, scope, chat_id) = (api, client, scope, chat_id);
        move |message_id: Id| {
            let (api, client, chat_id) = (api(), client.clone(), chat_id.clone());
            scope.spawn(async move {
                match delete_message(&api, client.cache(), &chat_id, message_id.as_str()).await {
                    Ok(()) => set_failure.set(None),
                    Err(err) => {
                        error!("Error deleting message: {err}");
                        set_failure.set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let feed = move || {
        let me = user.get();
        messages.get().map(|result| match feed_state(result, me) {
            Err(err) => view! { <Failure message=err.to_string() /> }.into_view(),
            Ok(None) => view! { <Loading /> }.into_view(),
            Ok(Some((messages, me))) => messages
                .iter()
                .rev()
                .map(|message| {
                    let mine = message.is_authored_by(&me);
                    let id = message.id.clone();
                    let is_editing = {
                        let id = id.clone();
                        Signal::derive(move || editing.with(|editing| editing.as_ref() == Some(&id)))
                    };
                    let text = message.text.clone();
                    let on_edit = {
                        let id = id.clone();
                        Callback::new(move |_| {
                            editing.set(Some(id.clone()));
                            draft.set(text.clone());
                        })
                    };
                    let on_save = Callback::new({
                        let save = save.clone();
                        move |_| save()
                    });
                    let on_cancel = Callback::new(move |_| editing.set(None));
                    let on_delete = Callback::new({
                        let remove = remove.clone();
                        move |_| remove(id.clone())
                    });
                    view! {
                        <Message
                            message=message.clone()
                            mine
                            editing=is_editing
                            draft
                            on_edit
                            on_save
                            on_cancel
                            on_delete
                        />
                    }
                })
                .collect::<Vec<_>>()
                .into_view(),
        })
    };

    view! {
        <div class="h-full max-h-full grow flex flex-col scrollbar lg:w-4/5 w-screen max-w-screen">
            <main class="grow flex flex-col-reverse overflow-auto">
                <Transition fallback=move || {
                    view! { <Loading /> }
                }>{feed.clone()}</Transition>
            </main>
            {move || failure.get().map(|message| view! { <Failure message /> })}
            <form class="w-full" on:submit=send_message>
                <label for="chat" class="sr-only">
                    Your message
                </label>
                <div class="flex items-center px-3 py-2 bg-gray-50 dark:bg-gray-700">
                    <input
                        id="chat"
                        class="block mx-4 p-2.5 w-full text-sm text-gray-900 bg-white rounded-lg border border-gray-300 focus:ring-blue-500 focus:border-blue-500 dark:bg-gray-800 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white dark:focus:ring-blue-500 dark:focus:border-blue-500"
                        placeholder="New message"
                        on:input=update_message_input
                        prop:value=message
                    />
                    <button
                        type="submit"
                        class="inline-flex justify-center p-2 text-blue-600 rounded-full cursor-pointer hover:bg-blue-100 dark:text-blue-500 dark:hover:bg-gray-600"
                    >
                        <svg
                            class="w-5 h-5 rotate-90 rtl:-rotate-90"
                            aria-hidden="true"
                            xmlns="http://www.w3.org/2000/svg"
                            fill="currentColor"
                            viewBox="0 0 18 20"
                        >
                            <path d="m17.914 18.594-8-18a1 1 0 0 0-1.828 0l-8 18a1 1 0 0 0 1.157 1.376L8 18.281V9a1 1 0 0 1 2 0v9.281l6.758 1.689a1 1 0 0 0 1.156-1.376Z" />
                        </svg>
                        <span class="sr-only">Send message</span>
                    </button>
                </div>
            </form>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_not_sent() {
        assert_eq!(prepared("  hello \n"), Some("hello"));
        assert_eq!(prepared("   "), None);
        assert_eq!(prepared(""), None);
    }

    #[test]
    fn load_failure_shows_without_a_user() {
        let failed = Err::<(), _>(Error::Http {
            method: "GET".to_owned(),
            path: "/chats/42/messages".to_owned(),
            status: 500,
        });
        assert!(matches!(
            feed_state(failed, None),
            Err(Error::Http { status: 500, .. })
        ));
        assert_eq!(feed_state(Ok(()), None), Ok(None));
    }
}
