// 该文件是 Adproof （广告校对） 项目的一部分。
// src/output/save_image_file.rs - 保存标注图像文件
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

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  model::CheckResult,
  output::{
    Render,
    draw::{Draw, DrawDetectionOnFrame},
    WrittenPaths, ensure_parent, target_path, url_file_path,
  },
};

const DEFAULT_EXTENSION: &str = "png";

pub struct SaveImageFileOutput {
  path: String,
  draw: Draw,
  written: WrittenPaths,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url_file_path(uri),
      draw: Draw::default(),
      written: WrittenPaths::default(),
    })
  }
}

impl SaveImageFileOutput {
  fn save_image(&self, path: &Path, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    ensure_parent(path).map_err(SaveImageFileError::IoError)?;

    image.save(path).map_err(SaveImageFileError::ImageError)?;

    info!("保存标注图像到文件: {}", path.display());

    Ok(())
  }
}

impl Render<ImageFrame, CheckResult> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &ImageFrame, result: &CheckResult) -> Result<(), Self::Error> {
    let Some(records) = result.detections() else {
      warn!("「{}」的结果不含坐标，跳过标注图像输出", frame.name());
      return Ok(());
    };
    let image = self.draw.draw_detection(frame, records);
    let path = target_path(&self.path, frame, DEFAULT_EXTENSION);
    // 单文件目标只能保存一张图像
    if self.written.contains(&path) {
      warn!(
        "标注图像 {} 在本次运行中已写入过，「{}」将覆盖它；多张图像请使用以 / 结尾的目录",
        path.display(),
        frame.name()
      );
    }
    self.save_image(&path, image)?;
    self.written.insert(path);
    Ok(())
  }
}
