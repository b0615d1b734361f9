//! Remote operation descriptors
//!
//! Builds the method, URL, headers and body of every call the coordinator
//! makes, plus the [`Completion`] tag telling [`Frontier::complete`] which
//! state to update once the host has a response. Nothing here performs I/O.
//!
//! [`Frontier::complete`]: crate::Frontier::complete

use std::fmt;

use base64::Engine;
use hcf_core::{codec, BatchId, Destination, Link};

use crate::error::Result;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four classes of remote operation, in scheduling priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Delete,
    Fetch,
    Flush,
    FollowUp,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Delete => write!(f, "delete"),
            Category::Fetch => write!(f, "fetch"),
            Category::Flush => write!(f, "flush"),
            Category::FollowUp => write!(f, "follow-up"),
        }
    }
}

/// Which state mutation applies when an operation completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Delete {
        destination: Destination,
        ids: usize,
        links: usize,
    },
    Fetch {
        destination: Destination,
        requested: u64,
    },
    Add {
        destination: Destination,
        links: usize,
    },
    ScheduleJob,
}

impl Completion {
    pub fn category(&self) -> Category {
        match self {
            Completion::Delete { .. } => Category::Delete,
            Completion::Fetch { .. } => Category::Fetch,
            Completion::Add { .. } => Category::Flush,
            Completion::ScheduleJob => Category::FollowUp,
        }
    }
}

/// A request for the host's transport to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub completion: Completion,
}

impl Operation {
    fn new(method: Method, url: String, completion: Completion) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            completion,
        }
    }

    fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Basic auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Hubstorage takes the API key as user with an empty password.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            username: key.into(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .finish()
    }
}

/// Decorate an operation with an HTTP basic `Authorization` header.
pub fn authenticate(mut operation: Operation, credentials: &Credentials) -> Operation {
    let token = base64::engine::general_purpose::STANDARD.encode(format!(
        "{}:{}",
        credentials.username, credentials.password
    ));
    operation
        .headers
        .retain(|(k, _)| !k.eq_ignore_ascii_case("Authorization"));
    operation
        .headers
        .push(("Authorization".to_string(), format!("Basic {}", token)));
    operation
}

/// Join URL components, trimming slashes at both ends of each.
pub fn url_component_join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|part| part.as_ref().trim_matches('/').to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds authenticated operation descriptors for one project.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
    project_id: String,
    credentials: Option<Credentials>,
    schedule_url: String,
    spider: Option<String>,
}

impl RequestBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            project_id: settings.project_id.clone(),
            credentials: settings.auth.clone().map(Credentials::api_key),
            schedule_url: settings.schedule_url.clone(),
            spider: settings.spider.clone(),
        }
    }

    /// `{endpoint}/hcf/{project}/{frontier}/s/{slot}[/suffix..]`
    fn slot_url(&self, destination: &Destination, suffix: &[&str]) -> String {
        let base = [
            self.endpoint.as_str(),
            "hcf",
            self.project_id.as_str(),
            destination.frontier(),
            "s",
            destination.slot(),
        ];
        url_component_join(base.iter().chain(suffix.iter()))
    }

    fn finish(&self, operation: Operation) -> Operation {
        match &self.credentials {
            Some(credentials) => authenticate(operation, credentials),
            None => operation,
        }
    }

    /// GET the slot queue, asking for `mincount` links.
    pub fn build_fetch(&self, destination: &Destination, mincount: u64) -> Operation {
        let count = mincount.to_string();
        let url = format!(
            "{}?{}",
            self.slot_url(destination, &["q"]),
            encode_form(&[("mincount", count.as_str())])
        );
        self.finish(Operation::new(
            Method::Get,
            url,
            Completion::Fetch {
                destination: destination.clone(),
                requested: mincount,
            },
        ))
    }

    /// POST the ids of consumed batches to the slot's `q/deleted` endpoint.
    pub fn build_delete(
        &self,
        destination: &Destination,
        ids: &[BatchId],
        links: usize,
    ) -> Result<Operation> {
        let body = codec::encode_delete_body(ids)?;
        Ok(self.finish(
            Operation::new(
                Method::Post,
                self.slot_url(destination, &["q", "deleted"]),
                Completion::Delete {
                    destination: destination.clone(),
                    ids: ids.len(),
                    links,
                },
            )
            .with_body("application/x-ndjson", body),
        ))
    }

    /// POST links to a slot.
    pub fn build_add(&self, destination: &Destination, links: &[Link]) -> Result<Operation> {
        let body = codec::encode_add_body(links)?;
        Ok(self.finish(
            Operation::new(
                Method::Post,
                self.slot_url(destination, &[]),
                Completion::Add {
                    destination: destination.clone(),
                    links: links.len(),
                },
            )
            .with_body("application/x-ndjson", body),
        ))
    }

    /// POST a schedule request for another run of the spider.
    pub fn build_schedule(&self) -> Operation {
        let spider = self.spider.as_deref().unwrap_or_default();
        let body = encode_form(&[("project", self.project_id.as_str()), ("spider", spider)]);
        self.finish(
            Operation::new(
                Method::Post,
                self.schedule_url.clone(),
                Completion::ScheduleJob,
            )
            .with_body("application/x-www-form-urlencoded", body.into_bytes()),
        )
    }
}
