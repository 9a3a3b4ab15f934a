use std::io::Write;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tempfile::NamedTempFile;

const BIN: &str = env!("CARGO_BIN_EXE_app-demo-api");

fn command() -> Command {
    let mut command = Command::new(BIN);
    command
        .env_remove("AWS_LAMBDA_RUNTIME_API")
        .env_remove("FUNCSHIM_MANIFEST");
    command
}

struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("free port")
}

#[test]
fn invoke_prints_the_response_for_an_event_file() {
    let inner = json!({
        "method": "POST",
        "path": "/generate",
        "headers": {"content-type": "application/json"},
        "body": json!({"style1": "悬疑", "count1": 6}).to_string(),
    });
    let event = json!({"Action": "Invoke", "body": inner.to_string()});
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(event.to_string().as_bytes()).expect("write event");

    let output = command()
        .args(["invoke", "--event"])
        .arg(file.path())
        .output()
        .expect("run binary");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let response: Value = serde_json::from_slice(&output.stdout).expect("json on stdout");
    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["headers"]["content-type"], "application/json");
    let reply: Value =
        serde_json::from_str(response["body"].as_str().expect("text body")).expect("reply");
    assert_eq!(reply["success"], true);
    assert_eq!(reply["主体文案"]["工具数量"], 6);
}

#[test]
fn invoke_reads_stdin_and_exits_non_zero_on_malformed_events() {
    let mut child = command()
        .arg("invoke")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn binary");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"not an event")
        .expect("write stdin");

    let output = child.wait_with_output().expect("wait");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("app-demo-api failed"), "stderr: {stderr}");
    assert!(stderr.contains("invalid platform event"), "stderr: {stderr}");
}

#[tokio::test]
async fn serve_accepts_connections_on_the_requested_port() {
    let mut manifest = NamedTempFile::new().expect("tempfile");
    write!(
        manifest,
        "[dev]\nctrl_c = false\n\n[logging.axum]\necho_stdout = false\n"
    )
    .expect("write manifest");

    let port = free_port();
    let child = command()
        .env("FUNCSHIM_MANIFEST", manifest.path())
        .args(["serve", "--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn binary");
    let _server = KillOnDrop(child);

    let url = format!("http://127.0.0.1:{port}/health");
    let client = reqwest::Client::new();
    let deadline = Instant::now() + Duration::from_secs(30);
    let response = loop {
        match client.get(&url).send().await {
            Ok(response) => break response,
            Err(err) if Instant::now() >= deadline => panic!("server never accepted: {err}"),
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), r#"{"status":"ok"}"#);
}
