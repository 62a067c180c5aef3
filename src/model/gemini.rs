// 该文件是 Adproof （广告校对） 项目的一部分。
// src/model/gemini.rs - Gemini 多模态模型
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
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  model::{
    CheckResult, Model, ModelCatalog, ModelDescriptor, ReviewMode,
    postprocess,
    prompt::PromptTemplate,
    selector::select_best_model,
    upstream::{
      UpstreamError, api_base_from_env, encode_frame, mode_from_url, model_from_url,
      non_empty_env, response_json_or_error,
    },
  },
};

const PROVIDER: &str = "Gemini";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_ENVS: &str = "GEMINI_API_KEY / GOOGLE_API_KEY";
const GENERATE_METHOD: &str = "generateContent";
const MODEL_PREFIX: &str = "models/";

pub struct GeminiModel {
  endpoint: String,
  api_key: String,
  model: String,
  mode: ReviewMode,
  prompt: String,
  http: Client,
}

pub struct GeminiModelBuilder {
  api_base: String,
  api_key: Option<String>,
  model: Option<String>,
  mode: ReviewMode,
  template: Option<PromptTemplate>,
  rules: String,
}

impl FromUrlWithScheme for GeminiModelBuilder {
  const SCHEME: &'static str = "gemini";
}

impl FromUrl for GeminiModelBuilder {
  type Error = UpstreamError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(UpstreamError::SchemeMismatch(format!(
        "模型地址必须使用 {} 方案，实际为 {}",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(GeminiModelBuilder {
      api_base: api_base_from_env("GEMINI_API_BASE", DEFAULT_API_BASE),
      api_key: None,
      model: model_from_url(url),
      mode: mode_from_url(url)?,
      template: None,
      rules: String::new(),
    })
  }
}

impl GeminiModelBuilder {
  /// 未显式给出时依次读取 GEMINI_API_KEY、GOOGLE_API_KEY
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
      .or_else(|| non_empty_env("GEMINI_API_KEY"))
      .or_else(|| non_empty_env("GOOGLE_API_KEY"))
      .ok_or(UpstreamError::MissingApiKey(API_KEY_ENVS))
  }

  pub fn catalog(&self) -> Result<GeminiCatalog, UpstreamError> {
    Ok(GeminiCatalog {
      api_base: self.api_base.clone(),
      api_key: self.resolve_api_key()?,
      http: Client::new(),
    })
  }

  pub fn build(self) -> Result<GeminiModel, UpstreamError> {
    let api_key = self.resolve_api_key()?;
    let model = match &self.model {
      Some(model) => model.clone(),
      None => {
        info!("未指定模型，从 Gemini 可用模型中自动选择...");
        let models = self.catalog()?.list_models()?;
        let selected = select_best_model(&models).ok_or(UpstreamError::NoUsableModel)?;
        info!("自动选择模型: {}", selected.name);
        selected.name.clone()
      }
    };
    let model = model_path(&model);
    let template = self
      .template
      .unwrap_or_else(|| PromptTemplate::builtin(self.mode));

    Ok(GeminiModel {
      endpoint: format!("{}/{}:{}", self.api_base, model, GENERATE_METHOD),
      api_key,
      model,
      mode: self.mode,
      prompt: template.render(&self.rules),
      http: Client::new(),
    })
  }
}

fn model_path(model: &str) -> String {
  let trimmed = model.trim();
  if trimmed.starts_with(MODEL_PREFIX) {
    trimmed.to_string()
  } else {
    format!("{MODEL_PREFIX}{trimmed}")
  }
}

impl GeminiModel {
  pub fn model_name(&self) -> &str {
    &self.model
  }

  pub fn mode(&self) -> ReviewMode {
    self.mode
  }

  fn request_body(&self, frame: &ImageFrame) -> Value {
    json!({
      "contents": [{
        "role": "user",
        "parts": [
          { "text": self.prompt },
          {
            "inline_data": {
              "mime_type": frame.mime_type(),
              "data": encode_frame(frame),
            }
          }
        ]
      }]
    })
  }

  /// 发送一次生成请求，返回模型的原始文本
  pub fn generate_text(&self, frame: &ImageFrame) -> Result<String, UpstreamError> {
    debug!("请求 {} ({} 字节图像)", self.endpoint, frame.encoded().len());
    let response = self
      .http
      .post(&self.endpoint)
      .header("x-goog-api-key", &self.api_key)
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

impl Model for GeminiModel {
  type Input = ImageFrame;
  type Output = CheckResult;
  type Error = UpstreamError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let raw = self.generate_text(input)?;
    Ok(postprocess(self.mode, raw))
  }
}

/// 拼接第一个候选回答中的所有文本片段
fn text_from_response(payload: &Value) -> Option<String> {
  let parts = payload
    .get("candidates")?
    .as_array()?
    .first()?
    .get("content")?
    .get("parts")?
    .as_array()?;
  let text: String = parts
    .iter()
    .filter_map(|part| part.get("text").and_then(Value::as_str))
    .collect();
  if text.trim().is_empty() {
    None
  } else {
    Some(text)
  }
}

pub struct GeminiCatalog {
  api_base: String,
  api_key: String,
  http: Client,
}

impl ModelCatalog for GeminiCatalog {
  type Error = UpstreamError;

  fn list_models(&self) -> Result<Vec<ModelDescriptor>, Self::Error> {
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
      let mut endpoint = format!("{}/models?pageSize=1000", self.api_base);
      if let Some(token) = &page_token {
        endpoint.push_str("&pageToken=");
        endpoint.push_str(&urlencoding::encode(token));
      }
      let response = self
        .http
        .get(&endpoint)
        .header("x-goog-api-key", &self.api_key)
        .send()
        .map_err(|source| UpstreamError::Transport {
          provider: PROVIDER,
          source,
        })?;
      let payload = response_json_or_error(PROVIDER, response)?;
      models.extend(descriptors_from_page(&payload));

      page_token = payload
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
      if page_token.is_none() {
        break;
      }
    }
    debug!("Gemini 返回 {} 个模型", models.len());
    Ok(models)
  }
}

fn descriptors_from_page(payload: &Value) -> Vec<ModelDescriptor> {
  let Some(rows) = payload.get("models").and_then(Value::as_array) else {
    return Vec::new();
  };
  rows
    .iter()
    .filter_map(|row| {
      let name = row.get("name").and_then(Value::as_str)?;
      let supports_generation = row
        .get("supportedGenerationMethods")
        .and_then(Value::as_array)
        .is_some_and(|methods| {
          methods
            .iter()
            .any(|method| method.as_str() == Some(GENERATE_METHOD))
        });
      Some(ModelDescriptor::new(name, supports_generation))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn builder(url: &str) -> anyhow::Result<GeminiModelBuilder> {
    Ok(GeminiModelBuilder::from_url(&Url::parse(url)?)?.with_api_key(Some("test-key".into())))
  }

  #[test]
  fn explicit_model_builds_without_network() -> anyhow::Result<()> {
    let model = builder("gemini://gemini-1.5-flash?mode=detect")?
      .with_api_base("http://127.0.0.1:9/v1beta/")
      .with_rules("「致します」は「いたします」に統一")
      .build()?;
    assert_eq!(model.model_name(), "models/gemini-1.5-flash");
    assert_eq!(model.mode(), ReviewMode::Detect);
    assert_eq!(
      model.endpoint,
      "http://127.0.0.1:9/v1beta/models/gemini-1.5-flash:generateContent"
    );
    assert!(model.prompt.contains("「致します」は「いたします」に統一"));
    Ok(())
  }

  #[test]
  fn request_body_carries_prompt_and_inline_image() -> anyhow::Result<()> {
    let model = builder("gemini://models/gemini-1.5-pro")?.build()?;
    let frame = ImageFrame::from_rgb_image("ad", RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])))?;
    let body = model.request_body(&frame);
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], json!(model.prompt));
    assert_eq!(parts[1]["inline_data"]["mime_type"], json!("image/png"));
    assert_eq!(parts[1]["inline_data"]["data"], json!(encode_frame(&frame)));
    Ok(())
  }

  #[test]
  fn wrong_scheme_is_rejected() -> anyhow::Result<()> {
    let url = Url::parse("openai://gpt-4o")?;
    assert!(matches!(
      GeminiModelBuilder::from_url(&url),
      Err(UpstreamError::SchemeMismatch(_))
    ));
    Ok(())
  }

  #[test]
  fn response_text_is_concatenated() {
    let payload = json!({
      "candidates": [{
        "content": {"parts": [{"text": "```json\n["}, {"text": "]\n```"}]}
      }]
    });
    assert_eq!(
      text_from_response(&payload),
      Some("```json\n[]\n```".to_string())
    );
    assert_eq!(text_from_response(&json!({"promptFeedback": {}})), None);
    assert_eq!(
      text_from_response(&json!({"candidates": [{"content": {"parts": []}}]})),
      None
    );
  }

  #[test]
  fn model_listing_flags_generation_support() {
    let payload = json!({
      "models": [
        {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
        {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]},
        {"name": "models/aqa"},
        {"displayName": "no name"}
      ]
    });
    let models = descriptors_from_page(&payload);
    assert_eq!(
      models,
      vec![
        ModelDescriptor::new("models/gemini-1.5-flash", true),
        ModelDescriptor::new("models/text-embedding-004", false),
        ModelDescriptor::new("models/aqa", false),
      ]
    );
  }
}
