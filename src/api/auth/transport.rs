use super::credentials::{
    clear_credentials, CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use super::refresh::RefreshOutcome;
use crate::api::client::build_http_client;
use crate::error::{ApiResult, StoreError, StoreResult, TransportError};
use crate::settings::ClientConfig;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const JSON_CONTENT_TYPE: &str = "application/json";
const TOKEN_EXPIRED_CODE: &str = "token_expired";

/// multipart 表单的纯数据描述。真正的 `reqwest::multipart::Form` 不能克隆，
/// 所以每次发送时重新构建，保证刷新后可以原样重放。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub(crate) fn to_form(&self) -> reqwest::multipart::Form {
        self.fields
            .iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
    }
}

#[derive(Clone, Debug)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Bytes(Bytes),
    Multipart(MultipartForm),
}

/// 一次请求的描述：方法、URL、调用方头部与请求体。可重复发送。
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn bytes(mut self, bytes: Bytes) -> Self {
        self.body = RequestBody::Bytes(bytes);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

/// 401 响应体对应的原因，只有 `token_expired` 值得刷新重试。
#[derive(Debug, PartialEq, Eq)]
enum UnauthorizedCause {
    TokenExpired,
    Other(Option<String>),
    Unparseable,
}

impl UnauthorizedCause {
    async fn from_response(response: Response) -> Self {
        match response.bytes().await {
            Ok(body) => Self::parse(&body),
            Err(_) => UnauthorizedCause::Unparseable,
        }
    }

    fn parse(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return UnauthorizedCause::Unparseable;
        };
        let code = value
            .get("detail")
            .and_then(|detail| detail.get("code"))
            .and_then(Value::as_str);
        match code {
            Some(TOKEN_EXPIRED_CODE) => UnauthorizedCause::TokenExpired,
            other => UnauthorizedCause::Other(other.map(str::to_string)),
        }
    }
}

/// 为所有出站请求附加 bearer token，并在 access token 过期时
/// 透明地刷新一次、重放一次。
#[derive(Clone)]
pub struct AuthenticatedTransport {
    http: Client,
    store: Arc<dyn CredentialStore>,
    config: Arc<ClientConfig>,
}

impl AuthenticatedTransport {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        let http = build_http_client(config.request_timeout)?;
        Ok(Self::with_client(http, config, store))
    }

    pub fn with_client(http: Client, config: ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            http,
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// 发送请求。
    ///
    /// - 非 401 的响应（包括其他 4xx/5xx）原样返回；
    /// - 401 且原因为 `token_expired`：刷新后重放一次，第二次的响应无论结果都直接返回；
    /// - 刷新时本地凭据读取失败：返回 [`TransportError::CredentialStore`]，凭据保持不动；
    /// - 其余 401（刷新被拒、其他原因、响应体无法解析）：清空凭据并返回
    ///   [`TransportError::SessionInvalid`]。
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, TransportError> {
        let token = self.current_access_token().await;
        let response = self.dispatch(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        match UnauthorizedCause::from_response(response).await {
            UnauthorizedCause::TokenExpired => {
                debug!(method = %request.method, url = %request.url, "access token expired, refreshing");
                match self.refresh_access_token().await {
                    RefreshOutcome::Refreshed(fresh_token) => {
                        debug!(url = %request.url, "token refreshed, replaying request once");
                        let retried = self.dispatch(request, Some(fresh_token.as_str())).await?;
                        return Ok(retried);
                    }
                    RefreshOutcome::StoreUnavailable(err) => {
                        warn!(url = %request.url, error = %err, "credential store unavailable during refresh");
                        return Err(TransportError::CredentialStore(err));
                    }
                    RefreshOutcome::Rejected => {
                        warn!(url = %request.url, "token refresh failed, ending session");
                    }
                }
            }
            UnauthorizedCause::Other(code) => {
                warn!(url = %request.url, code = ?code, "request unauthorized, ending session");
            }
            UnauthorizedCause::Unparseable => {
                warn!(url = %request.url, "unauthorized response body unreadable, ending session");
            }
        }

        self.clear_stored_credentials().await;
        Err(TransportError::SessionInvalid)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        self.build_request(request, token).send().await
    }

    fn build_request(&self, request: &ApiRequest, token: Option<&str>) -> RequestBuilder {
        let headers = compose_headers(request, token);
        let builder = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(headers);

        match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()),
        }
    }

    /// 只有两个 token 同时存在才带上 Authorization。
    /// 两次读取都成功且只剩一半时清掉残留；读取出错时不带 token 发送，但不动存储。
    async fn current_access_token(&self) -> Option<String> {
        let pair = self
            .with_store(|store| {
                let access = read_non_empty(store, ACCESS_TOKEN_KEY)?;
                let refresh = read_non_empty(store, REFRESH_TOKEN_KEY)?;
                Ok((access, refresh))
            })
            .await;

        match pair {
            Ok((Some(access), Some(_))) => Some(access),
            Ok((None, None)) => None,
            Ok(_) => {
                warn!("discarding half-populated credential pair");
                self.clear_stored_credentials().await;
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to read stored credentials; sending without token");
                None
            }
        }
    }

    /// 在阻塞线程池中访问凭据存储，避免 SQLite 文件 I/O 占用异步工作线程。
    pub(crate) async fn with_store<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn CredentialStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|err| StoreError::TaskFailed(err.to_string()))?
    }

    pub(crate) async fn read_credential(&self, key: &'static str) -> StoreResult<Option<String>> {
        self.with_store(move |store| read_non_empty(store, key)).await
    }

    pub(crate) async fn clear_stored_credentials(&self) {
        if let Err(err) = self.with_store(|store| clear_credentials(store)).await {
            warn!(error = %err, "failed to clear stored credentials");
        }
    }
}

/// 空字符串视同缺失。
fn read_non_empty(store: &dyn CredentialStore, key: &str) -> StoreResult<Option<String>> {
    Ok(store.get(key)?.filter(|value| !value.is_empty()))
}

/// 组装最终头部：非 multipart 默认 JSON，调用方头部可覆盖；multipart 不设
/// Content-Type，交给 reqwest 生成 boundary；有 token 时附加 Authorization。
fn compose_headers(request: &ApiRequest, token: Option<&str>) -> HeaderMap {
    let mut headers = request.headers.clone();
    match request.body {
        RequestBody::Multipart(_) => {
            headers.remove(CONTENT_TYPE);
        }
        _ => {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            }
        }
    }

    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("stored access token is not a valid header value; sending without it"),
        }
    }

    headers
}
