use crate::api::{Response, Transport};
use crate::error::Error;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, StatusCode};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8(self.body.clone().unwrap_or_default()).unwrap()
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(self.body.as_deref().unwrap_or(b"null")).unwrap()
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, String),
    Fail,
}

/// Transport that records every request and answers from canned replies.
/// Unknown routes answer `200 {}`. The last reply queued for a route sticks.
#[derive(Default)]
pub struct Recorder {
    requests: RefCell<Vec<Recorded>>,
    replies: RefCell<HashMap<(Method, String), VecDeque<Reply>>>,
}

impl Recorder {
    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
        self.queue(method, path, Reply::Status(status, body.to_owned()));
    }

    pub fn fail(&self, method: Method, path: &str) {
        self.queue(method, path, Reply::Fail);
    }

    fn queue(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .borrow_mut()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.requests.borrow().last().cloned()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    fn reply(&self, key: &(Method, String)) -> Reply {
        let mut replies = self.replies.borrow_mut();
        match replies.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Status(200, "{}".to_owned()),
        }
    }
}

#[async_trait(?Send)]
impl Transport for Recorder {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let recorded = Recorded {
            method: request.method().clone(),
            url: request.url().to_string(),
            path: request.url().path().to_owned(),
            headers: request.headers().clone(),
            body: request
                .body()
                .and_then(|body| body.as_bytes())
                .map(<[u8]>::to_vec),
        };
        let key = (recorded.method.clone(), recorded.path.clone());
        self.requests.borrow_mut().push(recorded);
        tokio::task::yield_now().await;
        match self.reply(&key) {
            Reply::Fail => Err(Error::Network("connection refused".to_owned())),
            Reply::Status(status, body) => Ok(Response::new(
                request.method().clone(),
                request.url().clone(),
                StatusCode::from_u16(status).unwrap(),
                body,
            )),
        }
    }
}
