//! HTTP 数据源工厂
//!
//! Builds the configuration used to open HTTP connections for media playback:
//! - 用户代理
//! - 跨协议重定向（始终允许）
//! - 固定的连接/读取超时
//! - 可选的默认请求头
//!
//! The factory is an immutable value. Turning it into a live client happens
//! in [`HttpDataSourceFactory::create_data_source`].

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, RANGE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::error_handling::{DataSourceError, Result};
use crate::utils::network::{
    headers_to_header_map, range_header_value, redirect_allowed, MAX_REDIRECTS,
};
use crate::utils::validation::is_http;

/// Default connect timeout of the underlying HTTP data source
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(8_000);

/// Default read timeout of the underlying HTTP data source
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(8_000);

/// HTTP数据源配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDataSourceConfig {
    /// 用户代理
    pub user_agent: Option<String>,
    /// 是否允许跨协议重定向 (http <-> https)
    pub allow_cross_protocol_redirects: bool,
    /// 连接超时
    pub connect_timeout: Duration,
    /// 读取超时
    pub read_timeout: Duration,
    /// 默认请求头；`None` 表示未安装
    pub default_request_headers: Option<HashMap<String, String>>,
}

/// Factory for HTTP data sources sharing one configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpDataSourceFactory {
    config: HttpDataSourceConfig,
}

/// Build a data-source factory for `user_agent` and optional default `headers`.
///
/// Cross-protocol redirects are always allowed and the timeouts are the fixed
/// defaults. A supplied header map, even an empty one, is copied and installed
/// as the default request headers.
pub fn build_data_source_factory(
    user_agent: Option<String>,
    headers: Option<&HashMap<String, String>>,
) -> HttpDataSourceFactory {
    let default_request_headers = headers.map(|headers| {
        headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<HashMap<_, _>>()
    });

    debug!(
        "Building HTTP data source factory (user agent: {:?}, default headers: {})",
        user_agent,
        default_request_headers.as_ref().map_or(0, |h| h.len())
    );

    HttpDataSourceFactory::new(HttpDataSourceConfig {
        user_agent,
        allow_cross_protocol_redirects: true,
        connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        read_timeout: DEFAULT_READ_TIMEOUT,
        default_request_headers,
    })
}

impl HttpDataSourceFactory {
    pub fn new(config: HttpDataSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpDataSourceConfig {
        &self.config
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.config.user_agent.as_deref()
    }

    pub fn allows_cross_protocol_redirects(&self) -> bool {
        self.config.allow_cross_protocol_redirects
    }

    pub fn default_request_headers(&self) -> Option<&HashMap<String, String>> {
        self.config.default_request_headers.as_ref()
    }

    /// Create a data source with its own HTTP client
    pub fn create_data_source(&self) -> Result<HttpDataSource> {
        let allow_cross_protocol = self.config.allow_cross_protocol_redirects;
        let redirect_policy = Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                return attempt.error(format!("too many redirects (max {})", MAX_REDIRECTS));
            }
            let allowed = match attempt.previous().last() {
                Some(from) => redirect_allowed(allow_cross_protocol, from, attempt.url()),
                None => true,
            };
            if allowed {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        // 配置的用户代理优先于默认请求头中的 user-agent
        let user_agent = self
            .config
            .user_agent
            .as_deref()
            .map(user_agent_header_value)
            .transpose()?;
        let mut default_headers = match &self.config.default_request_headers {
            Some(headers) => headers_to_header_map(headers)?,
            None => HeaderMap::new(),
        };
        if let Some(value) = &user_agent {
            default_headers.insert(USER_AGENT, value.clone());
        }

        let client = Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .read_timeout(self.config.read_timeout)
            .redirect(redirect_policy)
            .default_headers(default_headers)
            .build()?;

        Ok(HttpDataSource { client, user_agent })
    }
}

/// 单次请求描述：URI、字节偏移、可选长度及附加请求头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSpec {
    pub uri: String,
    pub position: u64,
    pub length: Option<u64>,
    pub headers: HashMap<String, String>,
}

impl DataSpec {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, position: u64, length: Option<u64>) -> Self {
        self.position = position;
        self.length = length;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

fn user_agent_header_value(user_agent: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(user_agent).map_err(|source| DataSourceError::InvalidHeaderValue {
        name: USER_AGENT.as_str().to_string(),
        source,
    })
}

/// An HTTP data source created by [`HttpDataSourceFactory`]
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: Client,
    user_agent: Option<HeaderValue>,
}

impl HttpDataSource {
    /// Build the GET request for `spec` without sending it.
    ///
    /// A configured user agent replaces any `user-agent` entry in `spec.headers`.
    pub fn build_request(&self, spec: &DataSpec) -> Result<Request> {
        if !is_http(Some(&spec.uri)) {
            return Err(DataSourceError::UnsupportedScheme {
                uri: spec.uri.clone(),
            });
        }
        let url = Url::parse(&spec.uri).map_err(|e| DataSourceError::InvalidUri {
            uri: spec.uri.clone(),
            message: e.to_string(),
        })?;

        let mut headers = headers_to_header_map(&spec.headers)?;
        if let Some(range) = range_header_value(spec.position, spec.length) {
            let value = HeaderValue::from_str(&range).map_err(|source| {
                DataSourceError::InvalidHeaderValue {
                    name: RANGE.as_str().to_string(),
                    source,
                }
            })?;
            headers.insert(RANGE, value);
        }
        if let Some(value) = &self.user_agent {
            headers.insert(USER_AGENT, value.clone());
        }

        let request = self.client.get(url).headers(headers).build()?;
        debug!("Built request {} {}", request.method(), request.url());
        Ok(request)
    }

    /// Send the request for `spec` and return the opened response
    pub async fn open(&self, spec: &DataSpec) -> Result<OpenedSource> {
        let request = self.build_request(spec)?;
        let response = self.client.execute(request).await?;
        let status = response.status();

        if status == StatusCode::RANGE_NOT_SATISFIABLE && spec.position > 0 {
            return Err(DataSourceError::PositionOutOfRange {
                position: spec.position,
            });
        }
        if !status.is_success() {
            return Err(DataSourceError::HttpStatus {
                status: status.as_u16(),
            });
        }

        debug!(
            "Opened {} (status {}, length {:?})",
            response.url(),
            status,
            response.content_length()
        );
        Ok(OpenedSource { response })
    }
}

/// A successfully opened HTTP response
#[derive(Debug)]
pub struct OpenedSource {
    response: Response,
}

impl OpenedSource {
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Final URL after redirects
    pub fn url(&self) -> &Url {
        self.response.url()
    }

    pub fn bytes_stream(self) -> impl Stream<Item = Result<Bytes>> {
        self.response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DataSourceError::from))
    }

    pub async fn read_to_end(self) -> Result<Bytes> {
        Ok(self.response.bytes().await?)
    }
}
