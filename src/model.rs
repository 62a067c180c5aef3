// 该文件是 Adproof （广告校对） 项目的一部分。
// src/model.rs - 模型与检查结果定义
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

use tracing::warn;

use crate::response::extract_json_array;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 可列出上游模型的服务
pub trait ModelCatalog {
  type Error;

  fn list_models(&self) -> Result<Vec<ModelDescriptor>, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
  pub name: String,
  pub supports_generation: bool,
}

impl ModelDescriptor {
  pub fn new(name: impl Into<String>, supports_generation: bool) -> Self {
    Self {
      name: name.into(),
      supports_generation,
    }
  }

  /// 已知支持内容生成的模型
  pub fn generative(name: impl Into<String>) -> Self {
    Self::new(name, true)
  }
}

/// 检查方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewMode {
  /// 模型直接输出 Markdown 表格与总评
  #[default]
  Report,
  /// 模型输出带坐标的 JSON 数组
  Detect,
}

impl ReviewMode {
  pub fn from_query(value: &str) -> Option<Self> {
    match value.to_ascii_lowercase().as_str() {
      "report" | "markdown" => Some(ReviewMode::Report),
      "detect" | "json" => Some(ReviewMode::Detect),
      _ => None,
    }
  }
}

/// 归一化坐标的满量程
pub const NORMALIZED_SCALE: f64 = 1000.0;

/// 归一化边界框，顺序为 (ymin, xmin, ymax, xmax)，取值范围 [0, 1000]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub ymin: f64,
  pub xmin: f64,
  pub ymax: f64,
  pub xmax: f64,
}

/// 像素坐标矩形，右下角包含在内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
  pub left: i32,
  pub top: i32,
  pub right: i32,
  pub bottom: i32,
}

impl BoundingBox {
  /// 越界、非有限值或上下颠倒的坐标返回 None，不做截断
  pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Option<Self> {
    let in_range = |v: f64| v.is_finite() && (0.0..=NORMALIZED_SCALE).contains(&v);
    if ![ymin, xmin, ymax, xmax].into_iter().all(in_range) || ymin > ymax || xmin > xmax {
      return None;
    }
    Some(Self {
      ymin,
      xmin,
      ymax,
      xmax,
    })
  }

  /// 按各轴自身的尺寸换算为像素坐标
  pub fn to_pixel_rect(&self, width: u32, height: u32) -> PixelRect {
    let scale = |v: f64, dim: u32| (v * dim as f64 / NORMALIZED_SCALE).round() as i32;
    PixelRect {
      left: scale(self.xmin, width),
      top: scale(self.ymin, height),
      right: scale(self.xmax, width),
      bottom: scale(self.ymax, height),
    }
  }
}

/// 一条检查发现
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionRecord {
  pub text: String,
  pub kind: String,
  pub reason: String,
  pub fix: String,
  pub bbox: Option<BoundingBox>,
}

/// 单次检查的结果
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
  Report(String),
  Detections(Vec<DetectionRecord>),
  /// 上游调用成功，但结构化结果无法解析
  Unparsed { raw: String, reason: String },
}

impl CheckResult {
  pub fn detections(&self) -> Option<&[DetectionRecord]> {
    match self {
      CheckResult::Detections(records) => Some(records),
      _ => None,
    }
  }
}

/// 将上游原始文本整理为检查结果
pub fn postprocess(mode: ReviewMode, raw: String) -> CheckResult {
  match mode {
    ReviewMode::Report => CheckResult::Report(raw.trim().to_string()),
    ReviewMode::Detect => match extract_json_array(&raw) {
      Ok(records) => CheckResult::Detections(records),
      Err(e) => {
        warn!("无法解析模型返回的 JSON: {}", e);
        CheckResult::Unparsed {
          raw,
          reason: e.to_string(),
        }
      }
    },
  }
}

pub mod prompt;
pub mod selector;

#[cfg(any(feature = "gemini", feature = "openai"))]
mod upstream;
#[cfg(any(feature = "gemini", feature = "openai"))]
pub use self::upstream::UpstreamError;

#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "gemini")]
pub use self::gemini::{GeminiCatalog, GeminiModel, GeminiModelBuilder};

#[cfg(feature = "openai")]
mod openai;
#[cfg(feature = "openai")]
pub use self::openai::{OpenAiCatalog, OpenAiModel, OpenAiModelBuilder};
