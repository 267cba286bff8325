use reqwest::{
    header::{ACCEPT, USER_AGENT},
    redirect::Policy,
    Client, RequestBuilder, StatusCode,
};
use std::ops::Deref;
use thiserror::Error;

const USER_AGENT_VALUE: &str = concat!("nooksmith/", env!("CARGO_PKG_VERSION"));

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        HttpClient {
            client: Client::new(),
        }
    }

    /// A client that reports redirects instead of following them.
    pub fn without_redirects() -> Result<Self, Error> {
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|cause| Error::BuildClientError { cause })?;

        Ok(HttpClient { client })
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

pub trait Headers {
    fn default_headers(self) -> RequestBuilder;
}

impl Headers for RequestBuilder {
    fn default_headers(self) -> RequestBuilder {
        self.header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "text/html,application/octet-stream,*/*")
    }
}

pub trait ResponseHandler {
    async fn handle(self) -> Result<String, Error>;
}

impl ResponseHandler for reqwest::Response {
    async fn handle(self) -> Result<String, Error> {
        let response = ensure_success(self)?;

        response
            .text()
            .await
            .map_err(|cause| Error::ReadResponseTextError { cause })
    }
}

pub fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::UnexpectedStatus {
            status,
            url: response.url().to_string(),
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to build the http client")]
    BuildClientError {
        #[source]
        cause: reqwest::Error,
    },
    #[error("{url} answered with {status}")]
    UnexpectedStatus { status: StatusCode, url: String },
    #[error("Failed to read response text")]
    ReadResponseTextError {
        #[source]
        cause: reqwest::Error,
    },
}
