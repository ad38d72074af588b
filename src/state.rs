use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend identifier. The wire format is a string, numeric ids are accepted
/// and kept in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_owned())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Id(text),
            Raw::Number(number) => Id(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Author {
    pub id: Id,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Chat {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub user_ids: Vec<Id>,
    #[serde(default)]
    pub owner_id: Option<Id>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub id: Id,
    pub user: Author,
    pub text: String,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Only the author gets edit and delete controls. The backend remains the
    /// authority on whether the change is allowed.
    pub fn is_authored_by(&self, user: &User) -> bool {
        self.user.id == user.id
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Meta {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatCollection {
    #[serde(default)]
    pub meta: Option<Meta>,
    pub chats: Vec<Chat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageCollection {
    #[serde(default)]
    pub meta: Option<Meta>,
    pub messages: Vec<Message>,
}

pub mod timestamp {
    use super::*;
    use serde::de::Error as _;

    /// RFC 3339, or ISO 8601 without an offset which is read as UTC.
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|date| date.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
            })
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub fn optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn messages_from_the_backend() {
        let payload = r#"{
            "meta": {"count": 2},
            "messages": [
                {"id": 7, "user": {"id": "pony", "username": "Pony"}, "text": "hello",
                 "created_at": "2024-03-01T10:15:00"},
                {"id": "8", "user": {"id": "bandit", "username": "Bandit"}, "text": "bye",
                 "created_at": "2024-03-01T11:15:00.250+01:00"}
            ]
        }"#;
        let collection: MessageCollection = serde_json::from_str(payload).unwrap();
        assert_eq!(collection.meta, Some(Meta { count: 2 }));
        let [first, second] = &collection.messages[..] else {
            panic!("two messages");
        };
        assert_eq!(first.id.as_str(), "7");
        assert_eq!(
            first.created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap()
        );
        assert_eq!(second.id, Id::from("8"));
        assert_eq!(
            second.created_at.timestamp_millis(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap().timestamp_millis() + 250
        );
    }

    #[test]
    fn chats_without_optional_fields() {
        let collection: ChatCollection =
            serde_json::from_str(r#"{"chats": [{"id": "42", "name": "nomads"}]}"#).unwrap();
        assert_eq!(collection.meta, None);
        assert_eq!(collection.chats[0].name, "nomads");
        assert!(collection.chats[0].user_ids.is_empty());
        assert_eq!(collection.chats[0].created_at, None);
    }

    #[test]
    fn authorship() {
        let me = User {
            id: Id::from("pony"),
            username: "Pony".to_owned(),
            email: "pony@example.com".to_owned(),
            created_at: Utc::now(),
        };
        let mut message = Message {
            id: Id::from("1"),
            user: Author {
                id: Id::from("pony"),
                username: "Pony".to_owned(),
            },
            text: "hi".to_owned(),
            created_at: Utc::now(),
        };
        assert!(message.is_authored_by(&me));
        message.user.id = Id::from("bandit");
        assert!(!message.is_authored_by(&me));
    }

    #[test]
    fn garbage_timestamps_are_rejected() {
        assert!(timestamp::parse("yesterday").is_err());
    }
}
