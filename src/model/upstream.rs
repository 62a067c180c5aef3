// 该文件是 Adproof （广告校对） 项目的一部分。
// src/model/upstream.rs - 上游 API 公共部分
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::blocking::Response;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::{frame::ImageFrame, model::ReviewMode};

const ERROR_BODY_LIMIT: usize = 512;

#[derive(Error, Debug)]
pub enum UpstreamError {
  #[error("未设置 API 密钥（{0}）")]
  MissingApiKey(&'static str),
  #[error("{provider} 请求失败: {source}")]
  Transport {
    provider: &'static str,
    source: reqwest::Error,
  },
  #[error("{provider} 请求失败 ({code}): {body}")]
  Status {
    provider: &'static str,
    code: u16,
    body: String,
  },
  #[error("{provider} 返回了无效的 JSON: {source}")]
  InvalidPayload {
    provider: &'static str,
    source: serde_json::Error,
  },
  #[error("{0} 没有返回文本内容")]
  EmptyResponse(&'static str),
  #[error("没有可用的模型")]
  NoUsableModel,
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("未知的检查方式: {0}")]
  UnknownMode(String),
}

/// 读取非空环境变量
pub(crate) fn non_empty_env(key: &str) -> Option<String> {
  std::env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

/// API 地址去掉末尾的斜杠
pub(crate) fn api_base_from_env(key: &str, default: &str) -> String {
  non_empty_env(key)
    .map(|value| value.trim_end_matches('/').to_string())
    .unwrap_or_else(|| default.to_string())
}

/// 从 `?mode=` 查询参数解析检查方式，缺省为 report
pub(crate) fn mode_from_url(url: &Url) -> Result<ReviewMode, UpstreamError> {
  match url.query_pairs().find(|(k, _)| k == "mode") {
    Some((_, value)) => {
      ReviewMode::from_query(&value).ok_or_else(|| UpstreamError::UnknownMode(value.into_owned()))
    }
    None => Ok(ReviewMode::default()),
  }
}

/// URL 主机部分即模型名，`auto` 或空表示自动选择
pub(crate) fn model_from_url(url: &Url) -> Option<String> {
  let host = url.host_str().unwrap_or_default();
  let path = url.path().trim_matches('/');
  let name = match (host.is_empty(), path.is_empty()) {
    (true, _) => path.to_string(),
    (false, true) => host.to_string(),
    (false, false) => format!("{host}/{path}"),
  };
  if name.is_empty() || name.eq_ignore_ascii_case("auto") {
    None
  } else {
    Some(name)
  }
}

pub(crate) fn encode_frame(frame: &ImageFrame) -> String {
  BASE64.encode(frame.encoded())
}

pub(crate) fn response_json_or_error(
  provider: &'static str,
  response: Response,
) -> Result<Value, UpstreamError> {
  let status = response.status();
  let body = response
    .text()
    .map_err(|source| UpstreamError::Transport { provider, source })?;
  if !status.is_success() {
    return Err(UpstreamError::Status {
      provider,
      code: status.as_u16(),
      body: truncate_text(&body, ERROR_BODY_LIMIT),
    });
  }
  serde_json::from_str(&body).map_err(|source| UpstreamError::InvalidPayload { provider, source })
}

fn truncate_text(text: &str, limit: usize) -> String {
  if text.chars().count() <= limit {
    return text.to_string();
  }
  let mut out: String = text.chars().take(limit).collect();
  out.push('…');
  out
}
