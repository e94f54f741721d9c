// src/testing.rs

//! Test doubles: a scripted search session, a scripted operator, page
//! fixtures and a tiny local HTTP server for image downloads.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{FetchConfig, SearchFilters};
use crate::pipeline::{Downloader, DownloaderSettings};
use crate::services::{
    CaptchaGate, CaptchaReply, Challenge, ImageFetcher, InlineDispatch, OperatorPrompt,
    PageResponse, SearchSession,
};
use crate::utils::Interrupt;

pub const ENDPOINT: &str = "https://search.test/images/search";

/// Result page with an optional result list and one item per URL.
pub fn serp_page(last_page: Option<u32>, urls: &[String]) -> String {
    let items: String = urls
        .iter()
        .map(|url| {
            let payload = serde_json::json!({ "serp-item": { "img_href": url } });
            format!("<div class=\"serp-item\" data-bem='{payload}'></div>\n")
        })
        .collect();

    let content = match last_page {
        Some(last) => {
            let payload = serde_json::json!({ "serp-list": { "lastPage": last } });
            format!("<div class=\"serp-list\" data-bem='{payload}'>\n{items}</div>")
        }
        None => format!("<p>Nothing found</p>\n{items}"),
    };
    format!("<html><body>\n{content}\n</body></html>")
}

/// Challenge page with a captcha image and hidden form fields.
pub fn captcha_page() -> String {
    r#"<html><body>
<form class="form" method="get" action="/checkcaptcha">
  <img class="form__captcha" src="/captchaimg?key=k1">
  <input type="hidden" name="key" value="k1">
  <input type="hidden" name="retpath" value="https://search.test/images/search">
  <input type="text" name="rep">
</form>
</body></html>"#
        .to_string()
}

/// Search session answering from a script instead of the network.
///
/// Requests without a `p` parameter get the discovery page; page requests
/// get the URLs registered for that page.
#[derive(Default)]
pub struct ScriptedSession {
    last_page: Option<u32>,
    pages: HashMap<u32, Vec<String>>,
    failing_pages: HashSet<u32>,
    first_status: Option<u16>,
    captchas: usize,
    captcha_keyword: Option<String>,
    requests: Arc<Mutex<Vec<Url>>>,
    current: Option<PageResponse>,
    closed: bool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_page(mut self, last_page: u32) -> Self {
        self.last_page = Some(last_page);
        self
    }

    pub fn with_page(mut self, page: u32, urls: Vec<String>) -> Self {
        self.pages.insert(page, urls);
        self
    }

    /// Answer requests for `page` with 503.
    pub fn with_failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    /// Answer the very first request with `status`.
    pub fn with_first_status(mut self, status: u16) -> Self {
        self.first_status = Some(status);
        self
    }

    /// Answer the first `count` requests with a challenge.
    pub fn with_captchas(mut self, count: usize) -> Self {
        self.captchas = count;
        self
    }

    /// Answer every request for `keyword` with a challenge.
    pub fn with_captcha_for(mut self, keyword: &str) -> Self {
        self.captcha_keyword = Some(keyword.to_string());
        self
    }

    /// Every URL navigated to, in order.
    pub fn requests(&self) -> Arc<Mutex<Vec<Url>>> {
        Arc::clone(&self.requests)
    }

    fn respond(&mut self, url: &Url) -> (u16, String) {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(url.clone());
            requests.len() - 1
        };
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };

        if index == 0 {
            if let Some(status) = self.first_status {
                return (status, "<html><body>Server error</body></html>".to_string());
            }
        }
        if self.captchas > 0 {
            self.captchas -= 1;
            return (200, captcha_page());
        }
        if self.captcha_keyword.is_some() && param("text") == self.captcha_keyword {
            return (200, captcha_page());
        }

        match param("p").and_then(|p| p.parse::<u32>().ok()) {
            None => (200, serp_page(self.last_page, &[])),
            Some(page) if self.failing_pages.contains(&page) => {
                (503, "<html><body>Unavailable</body></html>".to_string())
            }
            Some(page) => {
                let urls = self.pages.get(&page).cloned().unwrap_or_default();
                (200, serp_page(self.last_page, &urls))
            }
        }
    }
}

#[async_trait]
impl SearchSession for ScriptedSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        if self.closed {
            return Err(AppError::session("session is closed"));
        }
        let (status, body) = self.respond(url);
        self.current = Some(PageResponse {
            url: url.clone(),
            status,
            body,
        });
        Ok(())
    }

    fn current_response(&self) -> Option<&PageResponse> {
        self.current.as_ref()
    }

    fn clear_responses(&mut self) {
        self.current = None;
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}

/// Operator giving canned replies, then quitting.
pub struct ScriptedPrompt {
    replies: VecDeque<CaptchaReply>,
    asked: Arc<Mutex<usize>>,
}

impl ScriptedPrompt {
    pub fn new(replies: Vec<CaptchaReply>) -> Self {
        Self {
            replies: replies.into(),
            asked: Arc::new(Mutex::new(0)),
        }
    }

    /// How many times the operator was asked.
    pub fn asked(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.asked)
    }
}

#[async_trait]
impl OperatorPrompt for ScriptedPrompt {
    async fn ask(&mut self, _challenge: &Challenge) -> Result<CaptchaReply> {
        *self.asked.lock().unwrap() += 1;
        Ok(self.replies.pop_front().unwrap_or(CaptchaReply::Quit))
    }
}

/// Canned HTTP response.
#[derive(Debug, Clone)]
pub struct Route {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl Route {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: b"error".to_vec(),
        }
    }

    pub fn image(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body: body.to_vec(),
        }
    }
}

/// Local HTTP/1.1 server serving fixed routes; unknown paths get 404.
pub struct ImageServer {
    addr: SocketAddr,
    hits: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl ImageServer {
    pub async fn start<P: Into<String>>(routes: Vec<(P, Route)>) -> Self {
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.into(), route))
                .collect(),
        );
        let hits = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server_hits = Arc::clone(&hits);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&server_hits);
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &hits).await;
                });
            }
        });

        Self { addr, hits, task }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn urls(&self, paths: &[String]) -> Vec<String> {
        paths.iter().map(|path| self.url(path)).collect()
    }

    /// Paths requested so far.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

impl Drop for ImageServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: tokio::net::TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let (read, mut write) = stream.split();
    let mut reader = BufReader::new(read);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    loop {
        let mut header = String::new();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target).to_string();
    hits.lock().unwrap().push(path.clone());

    let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));
    let reason = match route.status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason,
        route.content_type,
        route.body.len()
    );
    write.write_all(head.as_bytes()).await?;
    write.write_all(&route.body).await?;
    write.shutdown().await
}

/// `n` JPEG routes for `page`, with their paths.
pub fn image_routes(page: u32, n: usize) -> (Vec<(String, Route)>, Vec<String>) {
    let paths: Vec<String> = (0..n).map(|i| format!("/img/{page}-{i}.jpg")).collect();
    let routes = paths
        .iter()
        .map(|path| (path.clone(), Route::image("image/jpeg", b"JPEG")))
        .collect();
    (routes, paths)
}

/// Inline downloader over `session` with no page delay and no operator.
pub fn downloader(session: ScriptedSession, output_dir: &Path, interrupt: Interrupt) -> Downloader {
    let gate = CaptchaGate::new(
        Box::new(session),
        Box::new(ScriptedPrompt::new(Vec::new())),
        interrupt.clone(),
    );
    let fetcher = ImageFetcher::new(&FetchConfig::default()).unwrap();
    let settings = DownloaderSettings {
        endpoint: Url::parse(ENDPOINT).unwrap(),
        output_dir: output_dir.to_path_buf(),
        page_delay: Duration::ZERO,
        max_images_per_page: 30,
    };
    Downloader::new(
        gate,
        Box::new(InlineDispatch::new(fetcher)),
        &SearchFilters::default(),
        settings,
        interrupt,
    )
}
