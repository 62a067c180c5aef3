// 该文件是 Adproof （广告校对） 项目的一部分。
// src/output.rs - 输出定义
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

use std::{
  cell::RefCell,
  collections::HashSet,
  path::{Path, PathBuf},
};

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::ImageFrame, model::CheckResult};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

pub mod draw;
pub mod table;

mod report;
pub use self::report::{MarkdownFileOutput, ReportOutputError, StdoutOutput};

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "table_export")]
mod table_file;
#[cfg(feature = "table_export")]
pub use self::table_file::{TableFileError, TableFileOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "table_export")]
  #[error("表格导出错误: {0}")]
  TableFileError(#[from] TableFileError),
  #[error("报告输出错误: {0}")]
  ReportOutputError(#[from] ReportOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "table_export")]
  TableFileOutput(TableFileOutput),
  MarkdownFileOutput(MarkdownFileOutput),
  StdoutOutput(StdoutOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_image_file")]
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "table_export")]
      TableFileOutput::SCHEME => {
        let output = TableFileOutput::from_url(url)?;
        Ok(OutputWrapper::TableFileOutput(output))
      }
      MarkdownFileOutput::SCHEME => {
        let output = MarkdownFileOutput::from_url(url)?;
        Ok(OutputWrapper::MarkdownFileOutput(output))
      }
      StdoutOutput::SCHEME => {
        let output = StdoutOutput::from_url(url)?;
        Ok(OutputWrapper::StdoutOutput(output))
      }
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Render<ImageFrame, CheckResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &ImageFrame, result: &CheckResult) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "table_export")]
      OutputWrapper::TableFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::MarkdownFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::StdoutOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}

/// 同一结果写往多个输出
pub struct OutputSet {
  outputs: Vec<OutputWrapper>,
}

impl OutputSet {
  pub fn from_urls<'u>(urls: impl IntoIterator<Item = &'u Url>) -> Result<Self, OutputError> {
    let outputs = urls
      .into_iter()
      .map(OutputWrapper::from_url)
      .collect::<Result<_, _>>()?;
    Ok(Self { outputs })
  }

  pub fn len(&self) -> usize {
    self.outputs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outputs.is_empty()
  }
}

impl Render<ImageFrame, CheckResult> for OutputSet {
  type Error = OutputError;

  fn render_result(&self, frame: &ImageFrame, result: &CheckResult) -> Result<(), Self::Error> {
    for output in &self.outputs {
      output.render_result(frame, result)?;
    }
    Ok(())
  }
}

/// 以 `/` 结尾的路径视为目录，文件名取自输入图像
pub(crate) fn target_path(path: &str, frame: &ImageFrame, extension: &str) -> PathBuf {
  if path.ends_with('/') {
    Path::new(path).join(format!("{}.{}", frame.name(), extension))
  } else {
    PathBuf::from(path)
  }
}

pub(crate) fn ensure_parent(path: &Path) -> std::io::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  Ok(())
}

/// 本次运行中已写过的文件，再次写入时追加而不是截断
#[derive(Debug, Default)]
pub(crate) struct WrittenPaths(RefCell<HashSet<PathBuf>>);

impl WrittenPaths {
  pub(crate) fn contains(&self, path: &Path) -> bool {
    self.0.borrow().contains(path)
  }

  /// 只在写入成功后调用
  pub(crate) fn insert(&self, path: PathBuf) {
    self.0.borrow_mut().insert(path);
  }
}

/// URL 中的文件路径，`%` 编码会被还原
pub(crate) fn url_file_path(url: &Url) -> String {
  let path = urlencoding::decode(url.path())
    .map(|path| path.into_owned())
    .unwrap_or_else(|_| url.path().to_string());
  if url.path().ends_with('/') && !path.ends_with('/') {
    format!("{path}/")
  } else {
    path
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;

  #[test]
  fn directory_targets_use_frame_name() -> anyhow::Result<()> {
    let frame = ImageFrame::from_rgb_image("poster", RgbImage::new(1, 1))?;
    assert_eq!(
      target_path("/out/", &frame, "csv"),
      PathBuf::from("/out/poster.csv")
    );
    assert_eq!(
      target_path("/out/a.csv", &frame, "csv"),
      PathBuf::from("/out/a.csv")
    );
    Ok(())
  }

  #[test]
  fn url_paths_are_decoded() -> anyhow::Result<()> {
    let url = Url::parse("csv:///tmp/%E7%B5%90%E6%9E%9C.csv")?;
    assert_eq!(url_file_path(&url), "/tmp/結果.csv");
    let url = Url::parse("image:///tmp/out/")?;
    assert_eq!(url_file_path(&url), "/tmp/out/");
    Ok(())
  }

  #[test]
  fn unknown_scheme_is_rejected() -> anyhow::Result<()> {
    let url = Url::parse("rtsp://camera/stream")?;
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch(scheme)) if scheme == "rtsp"
    ));
    Ok(())
  }
}
