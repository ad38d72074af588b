use crate::auth::{use_api, use_auth};
use crate::cache::QueryKey;
use crate::chats::list_chats;
use crate::loading::{Failure, Loading};
use crate::query::use_query;
use crate::routes;
use crate::user::use_user;
use leptos::*;
use leptos_router::A;

#[component]
pub fn TopNav() -> impl IntoView {
    let auth = use_auth();
    let user = use_user();
    let link = "px-3 py-2 rounded-lg hover:bg-gray-100 dark:hover:bg-gray-700";
    view! {
        <nav class="flex flex-row items-center justify-between p-4 border-b-2 dark:border-gray-800 dark:text-white">
            <A href=routes::HOME class="text-base font-semibold uppercase text-gray-500 dark:text-gray-400">
                "Pony Express"
            </A>
            <div class="flex flex-row gap-2">
                {move || {
                    if auth.is_logged_in() {
                        let name = move || {
                            user.get().map(|user| user.username).unwrap_or_else(|| "profile".to_owned())
                        };
                        view! {
                            <A href=routes::CHATS class=link>
                                "chats"
                            </A>
                            <A href=routes::PROFILE class=link>
                                {name}
                            </A>
                        }
                            .into_view()
                    } else {
                        view! {
                            <A href=routes::LOGIN class=link>
                                "login"
                            </A>
                            <A href=routes::REGISTRATION class=link>
                                "register"
                            </A>
                        }
                            .into_view()
                    }
                }}
            </div>
        </nav>
    }
}

#[component]
pub fn ChatList(#[prop(into)] selected: Signal<Option<String>>) -> impl IntoView {
    let api = use_api();
    let chats = use_query(
        || (),
        |_: &()| QueryKey::chats(),
        move |_: ()| {
            let api = api();
            async move { list_chats(&api).await }
        },
    );
    view! {
        <div class="lg:w-1/5 w-full border-e-2 dark:border-gray-800 max-h-full overflow-y-auto dark:text-white">
            <h5 class="m-4 text-base py-2.5 font-semibold text-gray-500 uppercase dark:text-gray-400">
                Chats
            </h5>
            <Transition fallback=move || {
                view! { <Loading /> }
            }>
                {move || {
                    chats
                        .get()
                        .map(|result| match result {
                            Ok(chats) => {
                                view! {
                                    <ul class="space-y-2 font-medium">
                                        {chats
                                            .iter()
                                            .map(|chat| {
                                                let href = routes::chat(chat.id.as_str());
                                                let id = chat.id.to_string();
                                                let name = chat.name.clone();
                                                let active = move || {
                                                    selected.with(|selected| selected.as_deref() == Some(id.as_str()))
                                                };
                                                view! {
                                                    <li class:font-bold=active>
                                                        <A
                                                            href
                                                            class="flex items-center p-2 text-gray-900 rounded-lg dark:text-white hover:bg-gray-100 dark:hover:bg-gray-700 group"
                                                        >
                                                            <span class="ms-3">{name}</span>
                                                        </A>
                                                    </li>
                                                }
                                            })
                                            .collect::<Vec<_>>()}
                                    </ul>
                                }
                                    .into_view()
                            }
                            Err(err) => view! { <Failure message=err.to_string() /> }.into_view(),
                        })
                }}
            </Transition>
        </div>
    }
}
