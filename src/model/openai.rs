// 该文件是 Adproof （广告校对） 项目的一部分。
// src/model/openai.rs - OpenAI 多模态模型
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

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  model::{
    CheckResult, Model, ModelCatalog, ModelDescriptor, ReviewMode, postprocess,
    prompt::{PromptTemplate, USER_INSTRUCTION},
    upstream::{
      UpstreamError, api_base_from_env, encode_frame, mode_from_url, model_from_url,
      non_empty_env, response_json_or_error,
    },
  },
};

const PROVIDER: &str = "OpenAI";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 2000;

pub struct OpenAiModel {
  api_base: String,
  api_key: String,
  model: String,
  mode: ReviewMode,
  prompt: String,
  http: Client,
}

pub struct OpenAiModelBuilder {
  api_base: String,
  api_key: Option<String>,
  model: String,
  mode: ReviewMode,
  template: Option<PromptTemplate>,
  rules: String,
}

impl FromUrlWithScheme for OpenAiModelBuilder {
  const SCHEME: &'static str = "openai";
}

impl FromUrl for OpenAiModelBuilder {
  type Error = UpstreamError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(UpstreamError::SchemeMismatch(format!(
        "模型地址必须使用 {} 方案，实际为 {}",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(OpenAiModelBuilder {
      api_base: api_base_from_env("OPENAI_API_BASE", DEFAULT_API_BASE),
      api_key: None,
      // OpenAI 不提供能力标记，自动选择时沿用固定的视觉模型
      model: model_from_url(url).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
      mode: mode_from_url(url)?,
      template: None,
      rules: String::new(),
    })
  }
}

impl OpenAiModelBuilder {
  pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
    self.api_key = api_key.filter(|key| !key.trim().is_empty());
    self
  }

  pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
    self.api_base = api_base.into().trim_end_matches('/').to_string();
    self
  }

  pub fn with_template(mut self, template: Option<PromptTemplate>) -> Self {
    self.template = template;
    self
  }

  pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
    self.rules = rules.into();
    self
  }

  pub fn mode(&self) -> ReviewMode {
    self.mode
  }

  fn resolve_api_key(&self) -> Result<String, UpstreamError> {
    self
      .api_key
      .clone()
      .or_else(|| non_empty_env("OPENAI_API_KEY"))
      .ok_or(UpstreamError::MissingApiKey("OPENAI_API_KEY"))
  }

  pub fn catalog(&self) -> Result<OpenAiCatalog, UpstreamError> {
    Ok(OpenAiCatalog {
      api_base: self.api_base.clone(),
      api_key: self.resolve_api_key()?,
      http: Client::new(),
    })
  }

  pub fn build(self) -> Result<OpenAiModel, UpstreamError> {
    let api_key = self.resolve_api_key()?;
    let template = self
      .template
      .unwrap_or_else(|| PromptTemplate::builtin(self.mode));

    Ok(OpenAiModel {
      api_base: self.api_base,
      api_key,
      model: self.model,
      mode: self.mode,
      prompt: template.render(&self.rules),
      http: Client::new(),
    })
  }
}

impl OpenAiModel {
  pub fn model_name(&self) -> &str {
    &self.model
  }

  pub fn mode(&self) -> ReviewMode {
    self.mode
  }

  fn request_body(&self, frame: &ImageFrame) -> Value {
    let image_url = format!("data:{};base64,{}", frame.mime_type(), encode_frame(frame));
    json!({
      "model": self.model,
      "messages": [
        { "role": "system", "content": self.prompt },
        {
          "role": "user",
          "content": [
            { "type": "text", "text": USER_INSTRUCTION },
            { "type": "image_url", "image_url": { "url": image_url } }
          ]
        }
      ],
      "max_tokens": MAX_TOKENS,
    })
  }

  pub fn generate_text(&self, frame: &ImageFrame) -> Result<String, UpstreamError> {
    let endpoint = format!("{}/chat/completions", self.api_base);
    debug!("请求 {} ({} 字节图像)", endpoint, frame.encoded().len());
    let response = self
      .http
      .post(&endpoint)
      .bearer_auth(&self.api_key)
      .json(&self.request_body(frame))
      .send()
      .map_err(|source| UpstreamError::Transport {
        provider: PROVIDER,
        source,
      })?;
    let payload = response_json_or_error(PROVIDER, response)?;
    text_from_response(&payload).ok_or(UpstreamError::EmptyResponse(PROVIDER))
  }
}

impl Model for OpenAiModel {
  type Input = ImageFrame;
  type Output = CheckResult;
  type Error = UpstreamError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let raw = self.generate_text(input)?;
    Ok(postprocess(self.mode, raw))
  }
}

fn text_from_response(payload: &Value) -> Option<String> {
  payload
    .get("choices")?
    .as_array()?
    .first()?
    .get("message")?
    .get("content")?
    .as_str()
    .filter(|text| !text.trim().is_empty())
    .map(str::to_string)
}

pub struct OpenAiCatalog {
  api_base: String,
  api_key: String,
  http: Client,
}

impl ModelCatalog for OpenAiCatalog {
  type Error = UpstreamError;

  fn list_models(&self) -> Result<Vec<ModelDescriptor>, Self::Error> {
    let endpoint = format!("{}/models", self.api_base);
    let response = self
      .http
      .get(&endpoint)
      .bearer_auth(&self.api_key)
      .send()
      .map_err(|source| UpstreamError::Transport {
        provider: PROVIDER,
        source,
      })?;
    let payload = response_json_or_error(PROVIDER, response)?;
    Ok(descriptors_from_payload(&payload))
  }
}

fn descriptors_from_payload(payload: &Value) -> Vec<ModelDescriptor> {
  payload
    .get("data")
    .and_then(Value::as_array)
    .map(|rows| {
      rows
        .iter()
        .filter_map(|row| row.get("id").and_then(Value::as_str))
        .map(ModelDescriptor::generative)
        .collect()
    })
    .unwrap_or_default()
}
