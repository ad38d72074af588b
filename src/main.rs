mod api;
mod app;
mod auth;
mod cache;
mod chats;
mod config;
mod conversation;
mod error;
mod loading;
mod login;
mod message;
mod nav;
mod profile;
mod query;
mod routes;
mod state;
mod task;
mod user;

#[cfg(test)]
mod testing;

use app::*;
use leptos::*;

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(|| {
        view! { <App /> }
    })
}
