use super::credentials::{load_credentials, store_credentials, CredentialPair, REFRESH_TOKEN_KEY};
use super::transport::{ApiRequest, AuthenticatedTransport, MultipartForm};
use crate::api::client::{decode_json, ensure_success};
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// 登录后返回的用户信息。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    user: UserProfile,
}

#[derive(Debug, Default, Deserialize)]
struct RegistrationResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
}

/// 账号相关操作：登录/注册写入凭据，登出清空凭据。
/// 登录与注册本身不需要 bearer token，因此绕过 `send` 的 401 处理直接发出。
#[derive(Clone)]
pub struct AuthSession {
    transport: AuthenticatedTransport,
}

impl AuthSession {
    pub fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// 邮箱密码登录（表单字段沿用 OAuth2 password 约定：username/password）。
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<UserProfile> {
        let form = MultipartForm::new()
            .text("username", email)
            .text("password", password);
        let url = self.transport.config().auth_url("login");

        let response = self
            .transport
            .http()
            .post(url)
            .multipart(form.to_form())
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let payload: LoginResponse = decode_json(response, "login response").await?;

        let pair = CredentialPair {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
        };
        self.transport
            .with_store(move |store| store_credentials(store, &pair))
            .await?;
        info!(uid = %payload.user.uid, "signed in");
        Ok(payload.user)
    }

    /// 注册账号。后端通常要求先验证邮箱，只有响应同时带回两个 token 时才保存。
    pub async fn register(&self, request: &RegistrationRequest) -> ApiResult<Option<UserProfile>> {
        let url = self.transport.config().auth_url("register");
        let response = self
            .transport
            .http()
            .post(url)
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await?;
        let payload: RegistrationResponse = if body.iter().all(u8::is_ascii_whitespace) {
            RegistrationResponse::default()
        } else {
            serde_json::from_slice(&body).unwrap_or_default()
        };

        if let (Some(access_token), Some(refresh_token)) =
            (payload.access_token, payload.refresh_token)
        {
            let pair = CredentialPair {
                access_token,
                refresh_token,
            };
            self.transport
                .with_store(move |store| store_credentials(store, &pair))
                .await?;
            debug!("registration returned a session, credentials stored");
        }
        Ok(payload.user)
    }

    /// 尽力通知后端作废 refresh token，无论结果如何都清空本地凭据。
    pub async fn logout(&self) {
        let refresh_token = match self.transport.read_credential(REFRESH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "failed to read refresh token for logout");
                None
            }
        };
        if let Some(refresh_token) = refresh_token {
            let url = self.transport.config().auth_url("logout");
            let result = self
                .transport
                .http()
                .post(url)
                .json(&json!({ "refresh_token": refresh_token }))
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "logout endpoint rejected request");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "logout request failed"),
            }
        }
        self.transport.clear_stored_credentials().await;
        info!("signed out");
    }

    pub async fn current_user(&self) -> ApiResult<UserProfile> {
        let request = ApiRequest::get(self.transport.config().auth_url("me"));
        let response = self.transport.send(&request).await?;
        let response = ensure_success(response).await?;
        decode_json(response, "user profile").await
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(load_credentials(self.transport.store().as_ref()), Ok(Some(_)))
    }
}
