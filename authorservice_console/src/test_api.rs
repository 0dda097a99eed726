//! In-memory stand-in for the HTTP client, recording every call so tests can
//! assert on attempt counts, ordering and the tokens that writes carried.

use std::collections::{HashMap, HashSet};

use anyhow::bail;
use parking_lot::Mutex;
use serde_json::{json, Value};

use authorservice_catalog::resource::{FetchedResource, ResourceApi, WriteOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Fetch(String),
    Head(String),
    Put {
        path: String,
        body: Value,
        etag: Option<String>,
    },
    Delete {
        path: String,
        etag: Option<String>,
    },
    Create(String),
}

struct StoredDocument {
    body: Value,
    revision: i64,
}

impl StoredDocument {
    fn etag(&self) -> String {
        format!("\"v{}\"", self.revision)
    }
}

type PutRejection = Box<dyn Fn(&str, &Value) -> bool + Send + Sync>;

pub struct RecordingApi {
    documents: Mutex<HashMap<String, StoredDocument>>,
    calls: Mutex<Vec<RecordedCall>>,
    id_sequence: Mutex<i32>,
    /// Returns true when a put of this payload should be rejected with 409
    put_rejection: PutRejection,
    head_unsupported: bool,
    delete_rejections: HashSet<String>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            calls: Mutex::new(vec![]),
            id_sequence: Mutex::new(100),
            put_rejection: Box::new(|_, _| false),
            head_unsupported: false,
            delete_rejections: HashSet::new(),
        }
    }

    pub fn with_document(self, path: &str, body: Value) -> Self {
        self.documents
            .lock()
            .insert(path.to_string(), StoredDocument { body, revision: 1 });
        self
    }

    pub fn with_put_rejection(
        mut self,
        rejection: impl Fn(&str, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.put_rejection = Box::new(rejection);
        self
    }

    pub fn with_unsupported_head(mut self) -> Self {
        self.head_unsupported = true;
        self
    }

    pub fn with_delete_rejection(mut self, path: &str) -> Self {
        self.delete_rejections.insert(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        self.documents
            .lock()
            .get(path)
            .map(|document| document.body.clone())
    }

    pub fn put_attempts(&self, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RecordedCall::Put { path: p, .. } if p == path))
            .count()
    }

    pub fn delete_attempts(&self, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RecordedCall::Delete { path: p, .. } if p == path))
            .count()
    }

    pub fn last_put_body(&self, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find_map(|call| match call {
                RecordedCall::Put { path: p, body, .. } if p == path => Some(body.clone()),
                _ => None,
            })
    }

    /// Paths of deletes in the order they were issued
    pub fn delete_order(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Delete { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn token_matches(etag: Option<&str>, document: &StoredDocument) -> bool {
        match etag {
            // The transport turns a missing token into the wildcard
            None => true,
            Some(token) => token == document.etag(),
        }
    }
}

#[async_trait::async_trait]
impl ResourceApi for RecordingApi {
    async fn fetch(&self, path: &str) -> anyhow::Result<FetchedResource> {
        self.calls.lock().push(RecordedCall::Fetch(path.to_string()));

        // Paths without a trailing id are collection listings
        let is_resource = path
            .rsplit('/')
            .next()
            .map(|tail| tail.parse::<i32>().is_ok())
            .unwrap_or(false);
        if !is_resource {
            let prefix = format!("{}/", path);
            let documents = self.documents.lock();
            let mut bodies: Vec<Value> = documents
                .iter()
                .filter(|(stored_path, _)| stored_path.starts_with(&prefix))
                .map(|(_, document)| document.body.clone())
                .collect();
            bodies.sort_by_key(|body| body.get("id").and_then(Value::as_i64).unwrap_or_default());
            return Ok(FetchedResource {
                body: Value::Array(bodies),
                etag: None,
            });
        }

        match self.documents.lock().get(path) {
            Some(document) => Ok(FetchedResource {
                body: document.body.clone(),
                etag: Some(document.etag()),
            }),
            None => bail!("Resource {} not found", path),
        }
    }

    async fn head_etag(&self, path: &str) -> anyhow::Result<Option<String>> {
        self.calls.lock().push(RecordedCall::Head(path.to_string()));
        if self.head_unsupported {
            bail!("HEAD {} not supported", path)
        }
        match self.documents.lock().get(path) {
            Some(document) => Ok(Some(document.etag())),
            None => bail!("Resource {} not found", path),
        }
    }

    async fn conditional_put(
        &self,
        path: &str,
        body: &Value,
        etag: Option<&str>,
    ) -> anyhow::Result<WriteOutcome> {
        self.calls.lock().push(RecordedCall::Put {
            path: path.to_string(),
            body: body.clone(),
            etag: etag.map(String::from),
        });

        let mut documents = self.documents.lock();
        let document = match documents.get_mut(path) {
            Some(document) => document,
            None => {
                return Ok(WriteOutcome {
                    status: 404,
                    body: "no such resource".to_string(),
                })
            }
        };
        if !Self::token_matches(etag, document) {
            return Ok(WriteOutcome {
                status: 412,
                body: "token mismatch".to_string(),
            });
        }
        if (self.put_rejection)(path, body) {
            return Ok(WriteOutcome {
                status: 409,
                body: "rejected by server".to_string(),
            });
        }
        document.body = body.clone();
        document.revision += 1;
        Ok(WriteOutcome {
            status: 204,
            body: String::new(),
        })
    }

    async fn conditional_delete(
        &self,
        path: &str,
        etag: Option<&str>,
    ) -> anyhow::Result<WriteOutcome> {
        self.calls.lock().push(RecordedCall::Delete {
            path: path.to_string(),
            etag: etag.map(String::from),
        });

        let mut documents = self.documents.lock();
        let document = match documents.get(path) {
            Some(document) => document,
            None => {
                return Ok(WriteOutcome {
                    status: 404,
                    body: "no such resource".to_string(),
                })
            }
        };
        if !Self::token_matches(etag, document) {
            return Ok(WriteOutcome {
                status: 412,
                body: "token mismatch".to_string(),
            });
        }
        if self.delete_rejections.contains(path) {
            return Ok(WriteOutcome {
                status: 409,
                body: "referential integrity".to_string(),
            });
        }
        documents.remove(path);
        Ok(WriteOutcome {
            status: 204,
            body: String::new(),
        })
    }

    async fn create(&self, path: &str, body: &Value) -> anyhow::Result<String> {
        self.calls.lock().push(RecordedCall::Create(path.to_string()));
        let mut id_sequence = self.id_sequence.lock();
        *id_sequence += 1;
        let id = *id_sequence;
        let resource_path = format!("{}/{}", path, id);
        let mut body = body.clone();
        if let Some(map) = body.as_object_mut() {
            map.insert("id".to_string(), json!(id));
        }
        self.documents
            .lock()
            .insert(resource_path.clone(), StoredDocument { body, revision: 1 });
        Ok(resource_path)
    }
}
