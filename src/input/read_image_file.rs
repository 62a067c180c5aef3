// 该文件是 Adproof （广告校对） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::ImageFrame};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配")]
  SchemaMismatch,
  #[error("图像路径为空")]
  EmptyPath,
  #[error("无法读取图像文件 {}: {source}", .path.display())]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("无法解码图像 {}: {source}", .path.display())]
  ImageLoadError {
    path: PathBuf,
    source: image::ImageError,
  },
}

/// 单张图像文件，在迭代时才读取与解码
pub struct ImageFileInput {
  path: Option<PathBuf>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url.to_file_path().unwrap_or_else(|_| url.path().into());
    if path.as_os_str().is_empty() {
      return Err(ImageFileInputError::EmptyPath);
    }
    Ok(Self::new(path))
  }
}

impl ImageFileInput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    ImageFileInput {
      path: Some(path.into()),
    }
  }

  fn load(path: &Path) -> Result<ImageFrame, ImageFileInputError> {
    let encoded = std::fs::read(path).map_err(|source| ImageFileInputError::IoError {
      path: path.to_path_buf(),
      source,
    })?;
    let name = path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_default();
    let frame =
      ImageFrame::decode(name, encoded).map_err(|source| ImageFileInputError::ImageLoadError {
        path: path.to_path_buf(),
        source,
      })?;
    info!(
      "读取图像 {}: {}x{} {}",
      path.display(),
      frame.width(),
      frame.height(),
      frame.mime_type()
    );
    Ok(frame)
  }
}

impl Iterator for ImageFileInput {
  type Item = Result<ImageFrame, ImageFileInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    let path = self.path.take()?;
    Some(Self::load(&path))
  }
}
