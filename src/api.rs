use crate::config::Config;
use crate::error::Error;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;
use url::Url;

pub const JSON: &str = "application/json";
pub const FORM: &str = "application/x-www-form-urlencoded";

/// Sends one request and hands back the raw response.
///
/// The production implementation is [`ReqwestTransport`], which goes through
/// the browser `fetch` on wasm. There is no retry and no timeout: one call is
/// one attempt.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: Request) -> Result<Response, Error>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let method = request.method().clone();
        let url = request.url().clone();
        #[cfg(debug_assertions)]
        leptos::logging::log!("{method} {url}");
        let res = self.client.execute(request).await?;
        let status = res.status();
        let body = res.bytes().await?.to_vec();
        Ok(Response {
            method,
            url,
            status,
            body,
        })
    }
}

/// A response as it came off the wire. Nothing is parsed until the caller
/// asks for it.
#[derive(Debug, Clone)]
pub struct Response {
    method: Method,
    url: Url,
    status: StatusCode,
    body: Vec<u8>,
}

impl Response {
    #[cfg(test)]
    pub fn new(method: Method, url: Url, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            url,
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turns a non-success status into [`Error::Http`].
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Http {
                method: self.method.to_string(),
                path: self.url.path().to_owned(),
                status: self.status.as_u16(),
            })
        }
    }
}

enum Payload {
    Empty,
    Json(Vec<u8>),
    Form(String),
}

/// The HTTP client factory: verbs bound to a base URL and an optional bearer
/// token. Cheap to clone.
#[derive(Clone)]
pub struct Api {
    config: Rc<Config>,
    token: Option<String>,
    transport: Rc<dyn Transport>,
}

impl Api {
    pub fn new(config: Rc<Config>, token: Option<String>, transport: Rc<dyn Transport>) -> Self {
        let token = token.filter(|token| !token.is_empty());
        Self {
            config,
            token,
            transport,
        }
    }

    pub fn connect(config: Rc<Config>, token: Option<String>) -> Self {
        Self::new(config, token, Rc::new(ReqwestTransport::default()))
    }

    /// Same base URL and transport, another credential.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self::new(self.config.clone(), token, self.transport.clone())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub async fn get(&self, path: &str) -> Result<Response, Error> {
        self.send(Method::GET, path, Payload::Empty).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, Error> {
        let body = serde_json::to_vec(body)?;
        self.send(Method::POST, path, Payload::Json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, Error> {
        let body = serde_json::to_vec(body)?;
        self.send(Method::PUT, path, Payload::Json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, Error> {
        self.send(Method::DELETE, path, Payload::Empty).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Response, Error> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(Method::POST, path, Payload::Form(body)).await
    }

    async fn send(&self, method: Method, path: &str, payload: Payload) -> Result<Response, Error> {
        let request = self.build(method, path, payload)?;
        self.transport.send(request).await
    }

    fn build(&self, method: Method, path: &str, payload: Payload) -> Result<Request, Error> {
        let url = self.config.endpoint(path)?;
        let mut request = Request::new(method, url);
        let content_type = match payload {
            Payload::Empty => JSON,
            Payload::Json(body) => {
                *request.body_mut() = Some(body.into());
                JSON
            }
            Payload::Form(body) => {
                *request.body_mut() = Some(body.into());
                FORM
            }
        };
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::Config("token is not a valid header value".to_owned()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(request)
    }
}

/// Joins path segments, percent-encoding each one.
pub fn path(segments: &[&str]) -> String {
    let mut url = Url::parse("http://localhost/").expect("Static url");
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use serde_json::json;

    fn api(token: Option<&str>) -> (Api, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::default());
        let api = Api::new(
            Rc::new(Config::default()),
            token.map(str::to_owned),
            recorder.clone(),
        );
        (api, recorder)
    }

    #[tokio::test]
    async fn every_verb_carries_the_bearer_token() {
        let (api, recorder) = api(Some("abc"));
        api.get("/chats").await.unwrap();
        api.post("/chats/1/messages", &json!({"text": "hi"})).await.unwrap();
        api.put("/chats/1/messages/2", &json!({"text": "ho"})).await.unwrap();
        api.delete("/chats/1/messages/2").await.unwrap();
        api.post_form("/auth/token", &[("username", "pony")]).await.unwrap();

        let requests = recorder.requests();
        assert_eq!(requests.len(), 5);
        for request in requests {
            let values: Vec<_> = request.headers.get_all(AUTHORIZATION).iter().collect();
            assert_eq!(values, vec!["Bearer abc"]);
        }
    }

    #[tokio::test]
    async fn no_token_no_header() {
        let (api, recorder) = api(None);
        api.get("/chats").await.unwrap();
        let api = api.with_token(Some(String::new()));
        assert_eq!(api.token(), None);
        api.delete("/chats/1/messages/2").await.unwrap();

        for request in recorder.requests() {
            assert!(request.headers.get(AUTHORIZATION).is_none());
        }
    }

    #[tokio::test]
    async fn json_verbs_serialize_the_body() {
        let (api, recorder) = api(None);
        api.put("/chats/42/messages/7", &json!({"text": "bye"}))
            .await
            .unwrap();

        let request = recorder.last().unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.url, "http://127.0.0.1:8000/chats/42/messages/7");
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), JSON);
        assert_eq!(request.body_json(), json!({"text": "bye"}));
    }

    #[tokio::test]
    async fn form_post_is_url_encoded() {
        let (api, recorder) = api(Some("abc"));
        api.post_form("/auth/token", &[("username", "pony express"), ("password", "a&b")])
            .await
            .unwrap();

        let request = recorder.last().unwrap();
        let content_types: Vec<_> = request.headers.get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(content_types, vec![FORM]);
        assert_eq!(
            request.body_text(),
            "username=pony+express&password=a%26b"
        );
    }

    #[tokio::test]
    async fn response_is_returned_raw() {
        let (api, recorder) = api(None);
        recorder.respond(Method::GET, "/chats", 500, "not json");
        let response = api.get("/chats").await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.text(), "not json");
        assert!(matches!(response.json::<serde_json::Value>(), Err(Error::Parse(_))));
        assert_eq!(
            response.error_for_status().unwrap_err(),
            Error::Http {
                method: "GET".to_owned(),
                path: "/chats".to_owned(),
                status: 500
            }
        );
    }

    #[tokio::test]
    async fn network_failure_rejects() {
        let (api, recorder) = api(None);
        recorder.fail(Method::GET, "/chats");
        assert!(matches!(api.get("/chats").await, Err(Error::Network(_))));
    }

    #[test]
    fn segments_are_encoded() {
        assert_eq!(path(&["chats", "42", "messages"]), "/chats/42/messages");
        assert_eq!(path(&["chats", "a b/c"]), "/chats/a%20b%2Fc");
    }
}
