// src/services/captcha.rs

//! CAPTCHA-aware search requests.
//!
//! Every search request goes through [`CaptchaGate::guarded_get`]. When the
//! returned page is a challenge, the operator is asked for the answer and
//! the request is resubmitted until a regular page comes back or the
//! operator quits.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::QueryParams;
use crate::services::session::{PageResponse, SearchSession};
use crate::utils::{Interrupt, resolve_url, with_params};

const CAPTCHA_SELECTOR: &str = ".form__captcha";
const ANSWER_PARAM: &str = "rep";
const QUIT_SENTINEL: &str = "q";

/// A challenge page as shown to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Challenge {
    /// Absolute URL of the challenge image, if the page has one
    pub image_url: Option<String>,
    /// Hidden form fields to send back with the answer
    pub fields: QueryParams,
}

/// What the operator answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaReply {
    Answer(String),
    Quit,
}

impl CaptchaReply {
    /// Interpret one line of operator input.
    pub fn from_line(line: &str) -> Self {
        let line = line.trim();
        if line == QUIT_SENTINEL {
            CaptchaReply::Quit
        } else {
            CaptchaReply::Answer(line.to_string())
        }
    }
}

/// Source of operator answers.
#[async_trait]
pub trait OperatorPrompt: Send {
    async fn ask(&mut self, challenge: &Challenge) -> Result<CaptchaReply>;
}

/// Reads answers from standard input, one per line.
pub struct StdinPrompt {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperatorPrompt for StdinPrompt {
    async fn ask(&mut self, challenge: &Challenge) -> Result<CaptchaReply> {
        match &challenge.image_url {
            Some(image) => log::warn!(
                "Please, type the captcha shown at {image}, then press Enter or type [q] to exit"
            ),
            None => log::warn!("Please, type the captcha, then press Enter or type [q] to exit"),
        }
        // End of input counts as quitting.
        Ok(match self.lines.next_line().await? {
            Some(line) => CaptchaReply::from_line(&line),
            None => CaptchaReply::Quit,
        })
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Detect a challenge on a page; `None` for a regular page.
pub fn detect_challenge(response: &PageResponse) -> Result<Option<Challenge>> {
    let document = Html::parse_document(&response.body);
    let marker_sel = parse_selector(CAPTCHA_SELECTOR)?;
    let Some(marker) = document.select(&marker_sel).next() else {
        return Ok(None);
    };

    let img_sel = parse_selector("img")?;
    let image_src = if marker.value().name() == "img" {
        marker.value().attr("src")
    } else {
        marker
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
    };
    let image_url = image_src.map(|src| resolve_url(&response.url, src));

    let hidden_sel = parse_selector("input[type=hidden]")?;
    let form = marker
        .ancestors()
        .filter_map(scraper::ElementRef::wrap)
        .find(|el| el.value().name() == "form")
        .or_else(|| (marker.value().name() == "form").then_some(marker));
    let fields = form
        .map(|form| {
            form.select(&hidden_sel)
                .filter_map(|input| {
                    let name = input.value().attr("name")?;
                    let value = input.value().attr("value").unwrap_or("");
                    Some((name.to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(Challenge { image_url, fields }))
}

/// Wraps the search session and resolves CAPTCHA challenges interactively.
pub struct CaptchaGate {
    session: Box<dyn SearchSession>,
    prompt: Box<dyn OperatorPrompt>,
    interrupt: Interrupt,
}

impl CaptchaGate {
    pub fn new(
        session: Box<dyn SearchSession>,
        prompt: Box<dyn OperatorPrompt>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            session,
            prompt,
            interrupt,
        }
    }

    /// Issue a GET and return the first response that is not a challenge.
    ///
    /// Fails with [`AppError::OperatorAborted`] when the operator quits and
    /// with [`AppError::Interrupted`] on interrupt.
    pub async fn guarded_get(&mut self, url: &Url, params: &QueryParams) -> Result<PageResponse> {
        let mut target = with_params(url, params);

        loop {
            self.session.clear_responses();
            self.interrupt.guard(self.session.navigate(&target)).await??;

            let response = self
                .session
                .current_response()
                .cloned()
                .ok_or_else(|| AppError::session(format!("no response recorded for {target}")))?;

            let Some(challenge) = detect_challenge(&response)? else {
                return Ok(response);
            };

            log::warn!("CAPTCHA challenge received for {url}");
            match self.interrupt.guard(self.prompt.ask(&challenge)).await?? {
                CaptchaReply::Quit => return Err(AppError::OperatorAborted),
                CaptchaReply::Answer(answer) => {
                    let mut resubmit = params.clone();
                    resubmit.extend(challenge.fields);
                    resubmit.push((ANSWER_PARAM.to_string(), answer));
                    target = with_params(url, &resubmit);
                }
            }
        }
    }

    /// Release the underlying session.
    pub async fn close(&mut self) -> Result<()> {
        self.session.close().await
    }
}
