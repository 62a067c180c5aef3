// 该文件是 Adproof （广告校对） 项目的一部分。
// src/output/report.rs - Markdown 报告输出
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

use std::{fs::OpenOptions, io::Write};

use chrono::Local;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  model::CheckResult,
  output::{
    Render, WrittenPaths, ensure_parent, table::render_markdown, target_path, url_file_path,
  },
};

const EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum ReportOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 写入 Markdown 文件；同一文件的多张图像依次追加
pub struct MarkdownFileOutput {
  path: String,
  written: WrittenPaths,
}

impl FromUrlWithScheme for MarkdownFileOutput {
  const SCHEME: &'static str = "markdown";
}

impl FromUrl for MarkdownFileOutput {
  type Error = ReportOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ReportOutputError::SchemeMismatch);
    }
    Ok(MarkdownFileOutput {
      path: url_file_path(uri),
      written: WrittenPaths::default(),
    })
  }
}

impl Render<ImageFrame, CheckResult> for MarkdownFileOutput {
  type Error = ReportOutputError;

  fn render_result(&self, frame: &ImageFrame, result: &CheckResult) -> Result<(), Self::Error> {
    let path = target_path(&self.path, frame, EXTENSION);
    ensure_parent(&path)?;

    // 本次运行第一次写某个文件时截断，之后追加
    let append = self.written.contains(&path);
    let mut file = OpenOptions::new()
      .create(true)
      .write(true)
      .append(append)
      .truncate(!append)
      .open(&path)?;
    if append {
      file.write_all(b"\n")?;
    }
    file.write_all(render_markdown(frame.name(), result, Some(&Local::now())).as_bytes())?;
    info!("写入报告: {}", path.display());
    self.written.insert(path);
    Ok(())
  }
}

/// 打印到标准输出
pub struct StdoutOutput;

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = ReportOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ReportOutputError::SchemeMismatch);
    }
    Ok(StdoutOutput)
  }
}

impl Render<ImageFrame, CheckResult> for StdoutOutput {
  type Error = ReportOutputError;

  fn render_result(&self, frame: &ImageFrame, result: &CheckResult) -> Result<(), Self::Error> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", render_markdown(frame.name(), result, None))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;

  #[test]
  fn same_file_is_appended_within_a_run() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("report.md");
    std::fs::write(&path, "stale")?;
    let output = MarkdownFileOutput::from_url(&Url::parse(&format!("markdown://{}", path.display()))?)?;

    let first = ImageFrame::from_rgb_image("first", RgbImage::new(1, 1))?;
    let second = ImageFrame::from_rgb_image("second", RgbImage::new(1, 1))?;
    output.render_result(&first, &CheckResult::Report("| a |".into()))?;
    output.render_result(&second, &CheckResult::Detections(vec![]))?;

    let text = std::fs::read_to_string(&path)?;
    assert!(!text.contains("stale"));
    assert!(text.starts_with("## first\n"));
    assert!(text.contains("\n## second\n"));
    assert!(text.contains("指摘事項はありません。"));
    Ok(())
  }

  #[test]
  fn directory_target_writes_one_file_per_frame() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let output =
      MarkdownFileOutput::from_url(&Url::parse(&format!("markdown://{}/", temp.path().display()))?)?;
    let frame = ImageFrame::from_rgb_image("banner", RgbImage::new(1, 1))?;
    output.render_result(&frame, &CheckResult::Report("ok".into()))?;
    assert!(temp.path().join("banner.md").exists());
    Ok(())
  }

  #[test]
  fn failed_write_does_not_truncate_earlier_sections() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let output =
      MarkdownFileOutput::from_url(&Url::parse(&format!("markdown://{}/", temp.path().display()))?)?;
    // 同名目录占住目标路径，使这一帧的写入失败
    std::fs::create_dir(temp.path().join("blocked.md"))?;

    let first = ImageFrame::from_rgb_image("banner", RgbImage::new(1, 1))?;
    let blocked = ImageFrame::from_rgb_image("blocked", RgbImage::new(1, 1))?;
    output.render_result(&first, &CheckResult::Report("一回目".into()))?;
    assert!(output.render_result(&blocked, &CheckResult::Report("x".into())).is_err());
    output.render_result(&first, &CheckResult::Report("二回目".into()))?;

    let text = std::fs::read_to_string(temp.path().join("banner.md"))?;
    assert!(text.contains("一回目"));
    assert!(text.contains("二回目"));
    Ok(())
  }

  #[test]
  fn interleaved_targets_keep_appending() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let output =
      MarkdownFileOutput::from_url(&Url::parse(&format!("markdown://{}/", temp.path().display()))?)?;
    let a = ImageFrame::from_rgb_image("a", RgbImage::new(1, 1))?;
    let b = ImageFrame::from_rgb_image("b", RgbImage::new(1, 1))?;
    output.render_result(&a, &CheckResult::Report("a-1".into()))?;
    output.render_result(&b, &CheckResult::Report("b-1".into()))?;
    output.render_result(&a, &CheckResult::Report("a-2".into()))?;

    let text = std::fs::read_to_string(temp.path().join("a.md"))?;
    assert!(text.contains("a-1") && text.contains("a-2"));
    Ok(())
  }

  #[test]
  fn stdout_scheme_parses() -> anyhow::Result<()> {
    assert!(StdoutOutput::from_url(&Url::parse("stdout:")?).is_ok());
    assert!(StdoutOutput::from_url(&Url::parse("markdown:///x.md")?).is_err());
    Ok(())
  }
}
