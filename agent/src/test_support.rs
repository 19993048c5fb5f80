//! Test-only scripted collaborators: model backend, task executor and search.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::shape::TargetShape;
use crate::core::types::SearchResult;
use crate::io::model::{ModelBackend, ModelError, ModelRequest, StructuredModel};
use crate::io::search::{FETCH_FAILED, SearchError, SearchProvider};
use crate::tasks::{TaskExecutor, TaskRequest, ToolContext};

/// Create a deterministic search result numbered `n`.
pub fn search_result(n: usize) -> SearchResult {
    SearchResult {
        title: format!("Result {n}"),
        link: format!("https://example.com/{n}"),
        snippet: format!("Snippet {n}"),
    }
}

/// Tool context backed by a scripted model backend.
pub fn tool_context(backend: &Arc<ScriptedBackend>) -> ToolContext {
    ToolContext::new(StructuredModel::new(backend.clone()))
}

/// Model backend that replays scripted responses in order.
///
/// Once the script runs out every call fails with a generation error.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A successful raw response carrying `value` as JSON text.
    pub fn reply(value: Value) -> Result<String, ModelError> {
        Ok(value.to_string())
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Generation("script exhausted".to_string())))
    }
}

/// One task invocation observed by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorCall {
    pub description: &'static str,
    /// Text of all content turns joined by blank lines.
    pub prompt: String,
    pub shape: TargetShape,
    pub system_instruction: Option<String>,
}

/// Task executor that answers each task description from its own queue.
///
/// Missing or undecodable replies yield the caller's default, like an
/// exhausted real executor.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    replies: Mutex<HashMap<&'static str, VecDeque<Value>>>,
    calls: Mutex<Vec<ExecutorCall>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` for the next call with `description`.
    #[must_use]
    pub fn on(self, description: &'static str, reply: Value) -> Self {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(description)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_for(&self, description: &str) -> Vec<ExecutorCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.description == description)
            .collect()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn execute<T>(&self, request: TaskRequest, default: T) -> T
    where
        T: DeserializeOwned + Send + 'static,
    {
        let prompt = request
            .contents
            .iter()
            .map(|turn| turn.text())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.calls.lock().expect("calls lock").push(ExecutorCall {
            description: request.description,
            prompt,
            shape: request.shape.clone(),
            system_instruction: request.system_instruction.clone(),
        });
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .get_mut(request.description)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
                panic!(
                    "scripted reply {value} for '{}' does not decode: {err}",
                    request.description
                )
            }),
            None => default,
        }
    }
}

/// Search provider serving canned results and pages.
///
/// Unknown queries return no results; unknown pages return [`FETCH_FAILED`].
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    results: HashMap<String, Vec<SearchResult>>,
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    searches: Mutex<Vec<String>>,
    fetches: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_results(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    #[must_use]
    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }

    #[must_use]
    pub fn failing_query(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    /// Queries issued so far, in order.
    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().expect("searches lock").clone()
    }

    /// URLs fetched so far, in completion order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().expect("fetches lock").clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.searches
            .lock()
            .expect("searches lock")
            .push(query.to_string());
        if self.failing.contains(query) {
            return Err(SearchError::Request(format!("scripted failure for {query}")));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn fetch_rendered_content(&self, url: &str) -> String {
        self.fetches
            .lock()
            .expect("fetches lock")
            .push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| FETCH_FAILED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> TaskRequest {
        TaskRequest::new("describe", Vec::new(), TargetShape::string_list())
    }

    #[tokio::test]
    async fn exhausted_script_returns_default() {
        let executor = ScriptedExecutor::new().on("describe", json!(["a"]));
        let first: Vec<String> = executor.execute(request(), Vec::new()).await;
        let second: Vec<String> = executor.execute(request(), vec!["d".to_string()]).await;
        assert_eq!(first, vec!["a"]);
        assert_eq!(second, vec!["d"]);
    }

    #[tokio::test]
    #[should_panic(expected = "does not decode")]
    async fn mistyped_reply_panics() {
        let executor = ScriptedExecutor::new().on("describe", json!({ "not": "a list" }));
        let _: Vec<String> = executor.execute(request(), Vec::new()).await;
    }
}
