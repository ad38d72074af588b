//! Chats and messages on the wire.
//!
//! Mutations never touch local state: on success they invalidate the messages
//! of their chat and the feed re-fetches what the backend now holds.

use crate::api::{path, Api};
use crate::cache::{QueryCache, QueryKey};
use crate::error::Error;
use crate::state::{Chat, ChatCollection, Message, MessageCollection};
use serde::Serialize;

#[derive(Serialize)]
struct MessageBody<'a> {
    text: &'a str,
}

pub async fn list_chats(api: &Api) -> Result<Vec<Chat>, Error> {
    let response = api.get("/chats").await?.error_for_status()?;
    Ok(response.json::<ChatCollection>()?.chats)
}

pub async fn list_messages(api: &Api, chat_id: &str) -> Result<Vec<Message>, Error> {
    let response = api
        .get(&path(&["chats", chat_id, "messages"]))
        .await?
        .error_for_status()?;
    Ok(response.json::<MessageCollection>()?.messages)
}

pub async fn create_message(
    api: &Api,
    cache: &QueryCache,
    chat_id: &str,
    text: &str,
) -> Result<(), Error> {
    api.post(&path(&["chats", chat_id, "messages"]), &MessageBody { text })
        .await?
        .error_for_status()?;
    cache.invalidate(&QueryKey::messages(chat_id));
    Ok(())
}

pub async fn update_message(
    api: &Api,
    cache: &QueryCache,
    chat_id: &str,
    message_id: &str,
    text: &str,
) -> Result<(), Error> {
    api.put(
        &path(&["chats", chat_id, "messages", message_id]),
        &MessageBody { text },
    )
    .await?
    .error_for_status()?;
    cache.invalidate(&QueryKey::messages(chat_id));
    Ok(())
}

pub async fn delete_message(
    api: &Api,
    cache: &QueryCache,
    chat_id: &str,
    message_id: &str,
) -> Result<(), Error> {
    api.delete(&path(&["chats", chat_id, "messages", message_id]))
        .await?
        .error_for_status()?;
    cache.invalidate(&QueryKey::messages(chat_id));
    Ok(())
}
