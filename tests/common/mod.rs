use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

pub struct ServerGuard {
    pub base_url: String,
    /// The server's `--data-dir`, for assertions about what it wrote.
    #[allow(dead_code)]
    pub data_dir: std::path::PathBuf,
    _tempdir: tempfile::TempDir,
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_server() -> Result<ServerGuard> {
    let data_dir = tempfile::tempdir().context("create server tempdir")?;

    let addr_file = data_dir.path().join("addr.txt");

    let child = Command::new(env!("CARGO_BIN_EXE_streamhub-server"))
        .args([
            "--addr",
            "127.0.0.1:0",
            "--addr-file",
            addr_file.to_str().unwrap(),
            "--data-dir",
            data_dir.path().to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn streamhub-server")?;

    let base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&base_url)?;

    Ok(ServerGuard {
        base_url,
        data_dir: data_dir.path().to_path_buf(),
        _tempdir: data_dir,
        child,
    })
}

fn read_addr_file(addr_file: &std::path::Path) -> Result<String> {
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("addr file not written at {}", addr_file.display());
        }

        if let Ok(s) = std::fs::read_to_string(addr_file) {
            let s = s.trim();
            if !s.is_empty() {
                return Ok(format!("http://{}", s));
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}

pub fn wait_for_healthz(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("server did not become healthy at {}/healthz", base_url);
        }
        match client.get(format!("{}/healthz", base_url)).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Multipart registration with an inline avatar part.
pub fn register_user(
    client: &reqwest::blocking::Client,
    base_url: &str,
    handle: &str,
    email: &str,
    password: &str,
) -> Result<reqwest::blocking::Response> {
    let form = reqwest::blocking::multipart::Form::new()
        .text("full_name", format!("{} Example", handle))
        .text("email", email.to_string())
        .text("password", password.to_string())
        .text("handle", handle.to_string())
        .part(
            "avatar",
            reqwest::blocking::multipart::Part::bytes(vec![0x89, b'P', b'N', b'G'])
                .file_name("avatar.png"),
        );

    client
        .post(format!("{}/api/v1/users/register", base_url))
        .multipart(form)
        .send()
        .context("register user")
}

pub fn login(
    client: &reqwest::blocking::Client,
    base_url: &str,
    identifier: &str,
    password: &str,
) -> Result<reqwest::blocking::Response> {
    client
        .post(format!("{}/api/v1/users/login", base_url))
        .json(&serde_json::json!({
            "identifier": identifier,
            "password": password,
        }))
        .send()
        .context("login")
}

/// Login and hand back `(access_token, refresh_token)` from the body.
pub fn login_tokens(
    client: &reqwest::blocking::Client,
    base_url: &str,
    identifier: &str,
    password: &str,
) -> Result<(String, String)> {
    let body: serde_json::Value = login(client, base_url, identifier, password)?
        .error_for_status()
        .context("login status")?
        .json()
        .context("parse login")?;
    let access = body
        .get("access_token")
        .and_then(|v| v.as_str())
        .context("access_token missing")?
        .to_string();
    let refresh = body
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .context("refresh_token missing")?
        .to_string();
    Ok((access, refresh))
}

#[allow(dead_code)]
pub fn set_cookies(resp: &reqwest::blocking::Response) -> Vec<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}
