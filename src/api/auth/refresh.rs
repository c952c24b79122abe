use super::credentials::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use super::transport::AuthenticatedTransport;
use crate::error::StoreError;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

struct RefreshedTokens {
    access_token: String,
    rotated_refresh_token: Option<String>,
}

/// 一次续期的结果。读不到存储与服务端拒绝是两回事：前者不清空凭据。
pub(crate) enum RefreshOutcome {
    Refreshed(String),
    Rejected,
    StoreUnavailable(StoreError),
}

impl AuthenticatedTransport {
    /// 用本地保存的 refresh token 换取新的 access token。
    ///
    /// 成功时写回新的 access token（服务端轮换了 refresh token 才写回）。
    /// 没有 refresh token、网络错误、非 2xx、响应无法解析时清空两个 token 并返回 `None`；
    /// 没有 refresh token 时不会发起网络请求。
    /// 本地存储读取失败时返回 `None`，但不清空任何凭据。
    pub async fn refresh(&self) -> Option<String> {
        match self.refresh_access_token().await {
            RefreshOutcome::Refreshed(token) => Some(token),
            RefreshOutcome::Rejected | RefreshOutcome::StoreUnavailable(_) => None,
        }
    }

    pub(crate) async fn refresh_access_token(&self) -> RefreshOutcome {
        let refresh_token = match self.read_credential(REFRESH_TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no refresh token stored, skipping refresh");
                self.clear_stored_credentials().await;
                return RefreshOutcome::Rejected;
            }
            Err(err) => {
                warn!(error = %err, "failed to read refresh token, keeping credentials");
                return RefreshOutcome::StoreUnavailable(err);
            }
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(tokens) => {
                self.persist_refreshed(&tokens).await;
                info!(rotated = tokens.rotated_refresh_token.is_some(), "access token refreshed");
                RefreshOutcome::Refreshed(tokens.access_token)
            }
            Err(reason) => {
                warn!(%reason, "token refresh failed, clearing credentials");
                self.clear_stored_credentials().await;
                RefreshOutcome::Rejected
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<RefreshedTokens, String> {
        let url = self.config().auth_url("refresh");
        let response = self
            .http()
            .post(url)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| format!("token refresh request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "refresh endpoint returned HTTP {}",
                response.status()
            ));
        }

        let payload: RefreshResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse refresh response: {e}"))?;

        let access_token = payload
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| "missing access_token in refresh response".to_string())?;

        Ok(RefreshedTokens {
            access_token,
            rotated_refresh_token: payload.refresh_token.filter(|token| !token.is_empty()),
        })
    }

    async fn persist_refreshed(&self, tokens: &RefreshedTokens) {
        let access = tokens.access_token.clone();
        let rotated = tokens.rotated_refresh_token.clone();
        let result = self
            .with_store(move |store| {
                store.set(ACCESS_TOKEN_KEY, &access)?;
                if let Some(rotated) = rotated.as_deref() {
                    store.set(REFRESH_TOKEN_KEY, rotated)?;
                }
                Ok(())
            })
            .await;
        if let Err(err) = result {
            warn!(error = %err, "failed to persist refreshed tokens");
        }
    }
}
