//! Line-delimited JSON bridge to an external automation host.
//!
//! The IDE object model and the desktop window system are only reachable from
//! a process that can host them, so every capability call is forwarded to
//! that process as one request line and answered with one response line:
//!
//! ```text
//! -> {"id":7,"method":"child_item","params":{"instance":"vs-1","parent":"i3","name":"Core"}}
//! <- {"id":7,"result":"i9"}
//! <- {"id":8,"error":"Call was rejected by callee."}
//! ```
//!
//! An `error` reply becomes [`AppError::Automation`], which callers treat as
//! transient, or [`AppError::Window`] for window calls. Transport problems
//! become [`AppError::Host`].

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::{Automation, IdeSession, WindowSystem};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct BridgeResponse {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

struct BridgeIo {
    writer: BoxedWriter,
    reader: BufReader<BoxedReader>,
}

struct BridgeInner {
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    // Held so the host lives as long as the client; killed on drop.
    _child: std::sync::Mutex<Option<Child>>,
}

#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<BridgeInner>,
}

impl BridgeClient {
    /// Start the automation host and talk to it over its stdin/stdout.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let argv = shell_words::split(command_line)
            .map_err(|e| AppError::Config(format!("Invalid automation host command: {e}")))?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| AppError::Config("Automation host command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Host(format!("Failed to start {program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Host("Automation host stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Host("Automation host stdout unavailable".to_string()))?;

        tracing::info!(program = %program, pid = ?child.id(), "Automation host started");

        Ok(Self::build(Box::new(stdout), Box::new(stdin), Some(child)))
    }

    /// Talk to a host over an existing reader/writer pair.
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::build(Box::new(reader), Box::new(writer), None)
    }

    fn build(reader: BoxedReader, writer: BoxedWriter, child: Option<Child>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                io: Mutex::new(BridgeIo {
                    writer,
                    reader: BufReader::new(reader),
                }),
                next_id: AtomicU64::new(1),
                _child: std::sync::Mutex::new(child),
            }),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&BridgeRequest { id, method, params })?;
        line.push('\n');

        let mut io = self.inner.io.lock().await;
        io.writer.write_all(line.as_bytes()).await.map_err(transport)?;
        io.writer.flush().await.map_err(transport)?;

        loop {
            let mut reply = String::new();
            let read = io.reader.read_line(&mut reply).await.map_err(transport)?;
            if read == 0 {
                return Err(AppError::Host(
                    "Automation host closed its output".to_string(),
                ));
            }
            if reply.trim().is_empty() {
                continue;
            }

            let response: BridgeResponse = serde_json::from_str(&reply)
                .map_err(|e| AppError::Host(format!("Malformed reply to {method}: {e}")))?;

            // A reply left over from an abandoned call.
            if response.id != id {
                tracing::warn!(expected = id, received = response.id, "Discarding stale reply");
                continue;
            }

            if let Some(error) = response.error {
                return Err(AppError::Automation(format!("{method}: {error}")));
            }

            return serde_json::from_value(response.result)
                .map_err(|e| AppError::Host(format!("Unexpected reply to {method}: {e}")));
        }
    }
}

fn transport(e: std::io::Error) -> AppError {
    AppError::Host(format!("Automation host pipe failed: {e}"))
}

#[async_trait]
impl Automation for BridgeClient {
    async fn running_instances(&self) -> Result<Vec<InstanceId>> {
        self.call("running_instances", json!({})).await
    }

    async fn describe(&self, instance: &InstanceId) -> Result<InstanceDescription> {
        self.call("describe_instance", json!({ "instance": instance }))
            .await
    }

    fn attach(&self, handle: &AutomationHandle) -> Arc<dyn IdeSession> {
        Arc::new(BridgeSession {
            client: self.clone(),
            instance: handle.instance.clone(),
        })
    }
}

impl BridgeClient {
    async fn window_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.call(method, params).await.map_err(|e| match e {
            AppError::Automation(message) => AppError::Window(message),
            other => other,
        })
    }
}

#[async_trait]
impl WindowSystem for BridgeClient {
    async fn find_window(&self, title_prefix: &str) -> Result<Option<WindowHandle>> {
        self.window_call("find_window", json!({ "title_prefix": title_prefix }))
            .await
    }

    async fn bring_to_front(&self, window: WindowHandle) -> Result<()> {
        self.window_call("bring_to_front", json!({ "window": window }))
            .await
    }

    async fn send_confirm_key(&self, window: WindowHandle) -> Result<()> {
        self.window_call("send_confirm_key", json!({ "window": window }))
            .await
    }
}

/// Session bound to one instance; every request carries its id.
pub struct BridgeSession {
    client: BridgeClient,
    instance: InstanceId,
}

impl BridgeSession {
    async fn call<T: DeserializeOwned>(&self, method: &str, mut params: Value) -> Result<T> {
        params["instance"] = json!(self.instance);
        self.client.call(method, params).await
    }
}

#[async_trait]
impl IdeSession for BridgeSession {
    async fn execute_command(&self, command: &str) -> Result<()> {
        self.call("execute_command", json!({ "command": command }))
            .await
    }

    async fn solution_projects(&self) -> Result<Vec<ProjectNode>> {
        self.call("solution_projects", json!({})).await
    }

    async fn project_files(&self, project: &ProjectId) -> Result<Vec<String>> {
        self.call("project_files", json!({ "project": project }))
            .await
    }

    async fn save_project(&self, project: &ProjectId) -> Result<()> {
        self.call("save_project", json!({ "project": project })).await
    }

    async fn root_item(&self, name: &str) -> Result<UiItemId> {
        self.call("root_item", json!({ "name": name })).await
    }

    async fn child_item(&self, parent: &UiItemId, name: &str) -> Result<UiItemId> {
        self.call("child_item", json!({ "parent": parent, "name": name }))
            .await
    }

    async fn item_state(&self, item: &UiItemId) -> Result<UiItemState> {
        self.call("item_state", json!({ "item": item })).await
    }

    async fn select_item(&self, item: &UiItemId) -> Result<()> {
        self.call("select_item", json!({ "item": item })).await
    }

    async fn expand_item(&self, item: &UiItemId) -> Result<()> {
        self.call("expand_item", json!({ "item": item })).await
    }
}
