use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[allow(unused_imports)]
pub mod widgets {
    include!(concat!(env!("OUT_DIR"), "/widgets.rs"));
}

#[allow(unused_imports)]
pub mod cloud_accounts {
    include!(concat!(env!("OUT_DIR"), "/cloud_accounts.rs"));
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A request seen by [`CloudClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

/// In-memory client with the call surface the generated handlers expect. Records every
/// request and answers with canned JSON (`null` when nothing is registered).
#[derive(Debug, Clone, Default)]
pub struct CloudClient {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl CloudClient {
    pub fn respond(&self, method: &str, url: &str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{method} {url}"), response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn call(&self, method: &'static str, url: &str, body: Option<Value>) -> Value {
        self.requests.lock().unwrap().push(Request {
            method,
            url: url.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .get(&format!("{method} {url}"))
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        Ok(serde_json::from_value(self.call("GET", url, None))?)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        Ok(serde_json::from_value(self.call("POST", url, Some(body)))?)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        Ok(serde_json::from_value(self.call("PUT", url, Some(body)))?)
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        Ok(serde_json::from_value(self.call("PATCH", url, Some(body)))?)
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        self.call("DELETE", url, None);
        Ok(())
    }

    pub async fn delete_raw(&self, url: &str) -> Result<Value> {
        Ok(self.call("DELETE", url, None))
    }
}
