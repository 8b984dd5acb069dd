use derive_more::{Display, Error};
use reqwest::StatusCode;

#[derive(Debug, Display, Error)]
#[display(
    fmt = "{{err_code: {}, err_message: {}, internal_message: {}}}",
    err_code,
    err_message,
    internal_message
)]
pub struct ClientError {
    pub err_code: u16,
    pub err_message: String,
    pub internal_message: String,
    pub status_code: Option<StatusCode>,
}

impl ClientError {
    // 服务器不可达或超时
    pub fn network_err(err_message: &str, internal_message: &str) -> Self {
        Self {
            err_code: 1,
            err_message: format!("网络请求失败: {}", err_message),
            internal_message: internal_message.to_string(),
            status_code: None,
        }
    }

    // 4xx/5xx
    pub fn http_status_err(status_code: StatusCode, internal_message: &str) -> Self {
        Self {
            err_code: 2,
            err_message: format!("响应状态码不正确: {}", status_code.as_u16()),
            internal_message: internal_message.to_string(),
            status_code: Some(status_code),
        }
    }

    // 响应内容无法解析
    pub fn decode_err(err_message: &str, internal_message: &str) -> Self {
        Self {
            err_code: 3,
            err_message: format!("解析响应失败: {}", err_message),
            internal_message: internal_message.to_string(),
            status_code: None,
        }
    }

    // 2xx 但是 success 为 false
    pub fn rejected_err(err_message: &str, internal_message: &str) -> Self {
        Self {
            err_code: 4,
            err_message: format!("服务器拒绝了请求: {}", err_message),
            internal_message: internal_message.to_string(),
            status_code: None,
        }
    }

    pub fn is_not_found_err(&self) -> bool {
        self.status_code == Some(StatusCode::NOT_FOUND)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::decode_err(
                "响应内容不是合法的JSON",
                &format!("reqwest解码错误: {}", error),
            );
        }
        if let Some(status_code) = error.status() {
            return Self::http_status_err(status_code, &format!("reqwest状态错误: {}", error));
        }
        Self::network_err(
            "服务器暂不可用，请稍后重试",
            &format!("reqwest未处理错误: {}", error),
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::decode_err(
            "响应内容不是合法的JSON",
            &format!("serde_json解析错误: {}", error),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_404_counts_as_not_found() {
        let not_found = ClientError::http_status_err(StatusCode::NOT_FOUND, "");
        let server = ClientError::http_status_err(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(not_found.is_not_found_err());
        assert!(!server.is_not_found_err());
        assert!(!ClientError::network_err("", "").is_not_found_err());
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let error = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let error: ClientError = error.into();
        assert_eq!(error.err_code, 3);
        assert!(error.internal_message.contains("serde_json"));
    }
}
