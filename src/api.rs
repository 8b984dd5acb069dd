use async_trait::async_trait;
use reqwest::{header, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::csrf::{CsrfTokenAccessor, CSRF_HEADER};
use crate::error::ClientError;
use crate::model::notification::{
    ClickOutput, Envelope, ListQuery, NotificationCounts, NotificationList,
};

/// Server side of the notification panel.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list(&self, query: ListQuery) -> Result<NotificationList, ClientError>;
    async fn counts(&self) -> Result<NotificationCounts, ClientError>;
    async fn mark_read(&self, id: i32) -> Result<(), ClientError>;
    async fn mark_all_read(&self) -> Result<(), ClientError>;
    async fn delete(&self, id: i32) -> Result<(), ClientError>;
    async fn click(&self, id: i32) -> Result<ClickOutput, ClientError>;
}

pub struct HttpNotificationApi {
    base_url: String,
    cookie: String,
    csrf: CsrfTokenAccessor,
    request_client: reqwest::Client,
}

impl HttpNotificationApi {
    pub fn new(config: &ApiConfig, csrf: CsrfTokenAccessor) -> Result<Self, ClientError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            header::HeaderValue::from_static("XMLHttpRequest"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let request_client = ClientBuilder::new()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.whole_timeout))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout))
            .build()
            .map_err(|e| {
                tracing::error!("创建HTTP客户端失败: {}", e);
                e
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie: config.cookie.clone(),
            csrf,
            request_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&ListQuery>,
    ) -> Result<String, ClientError> {
        let mutating = method != Method::GET;
        let mut request = self
            .request_client
            .request(method.clone(), self.url(path))
            .header(header::CONTENT_TYPE, "application/json");
        if !self.cookie.is_empty() {
            request = request.header(header::COOKIE, self.cookie.as_str());
        }
        if mutating {
            request = request.header(CSRF_HEADER, self.csrf.token());
        }
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("[{} {}]发送请求失败: {}", method, path, e);
            e
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("[{} {}]读取响应失败: {}", method, path, e);
            e
        })?;
        if !status.is_success() {
            tracing::debug!(
                "[{} {}]响应状态码不正确: {}, 内容: {}",
                method,
                path,
                status.as_str(),
                body
            );
            return Err(ClientError::http_status_err(
                status,
                &format!("[{} {}]响应状态码: {}, 内容: {}", method, path, status.as_str(), body),
            ));
        }
        Ok(body)
    }

    async fn send_json<T>(
        &self,
        method: Method,
        path: &str,
        query: Option<&ListQuery>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Envelope,
    {
        let body = self.send(method, path, query).await?;
        let output: T = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("[{}]尝试反序列化文本失败: {}", path, e);
            e
        })?;
        if let Some(message) = output.rejected_message() {
            return Err(ClientError::rejected_err(
                &message,
                &format!("[{}]响应中success为false", path),
            ));
        }
        Ok(output)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self, query: ListQuery) -> Result<NotificationList, ClientError> {
        self.send_json(Method::GET, "get/", Some(&query)).await
    }

    async fn counts(&self) -> Result<NotificationCounts, ClientError> {
        self.send_json(Method::GET, "counts/", None).await
    }

    async fn mark_read(&self, id: i32) -> Result<(), ClientError> {
        self.send(Method::POST, &format!("mark-read/{}/", id), None)
            .await
            .map(|_| ())
    }

    async fn mark_all_read(&self) -> Result<(), ClientError> {
        self.send(Method::POST, "mark-all-read/", None)
            .await
            .map(|_| ())
    }

    async fn delete(&self, id: i32) -> Result<(), ClientError> {
        self.send(Method::DELETE, &format!("delete/{}/", id), None)
            .await
            .map(|_| ())
    }

    async fn click(&self, id: i32) -> Result<ClickOutput, ClientError> {
        self.send_json(Method::POST, &format!("click/{}/", id), None)
            .await
    }
}
