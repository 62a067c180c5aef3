// 该文件是 Adproof （广告校对） 项目的一部分。
// src/output/table_file.rs - CSV 表格导出
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

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  model::CheckResult,
  output::{
    Render, WrittenPaths, ensure_parent,
    table::{csv_header, csv_rows},
    target_path, url_file_path,
  },
};

const EXTENSION: &str = "csv";

#[derive(Error, Debug)]
pub enum TableFileError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

pub struct TableFileOutput {
  path: String,
  written: WrittenPaths,
}

impl FromUrlWithScheme for TableFileOutput {
  const SCHEME: &'static str = "csv";
}

impl FromUrl for TableFileOutput {
  type Error = TableFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(TableFileError::SchemeMismatch);
    }
    Ok(TableFileOutput {
      path: url_file_path(uri),
      written: WrittenPaths::default(),
    })
  }
}

impl Render<ImageFrame, CheckResult> for TableFileOutput {
  type Error = TableFileError;

  fn render_result(&self, frame: &ImageFrame, result: &CheckResult) -> Result<(), Self::Error> {
    let Some(records) = result.detections() else {
      warn!("「{}」的结果不是检查记录，跳过 CSV 导出", frame.name());
      return Ok(());
    };
    let path = target_path(&self.path, frame, EXTENSION);
    ensure_parent(&path)?;

    // 同一文件在本次运行中只写一次表头，之后的图像追加行
    let append = self.written.contains(&path);
    let mut file = OpenOptions::new()
      .create(true)
      .write(true)
      .append(append)
      .truncate(!append)
      .open(&path)?;
    if !append {
      file.write_all(csv_header().as_bytes())?;
    }
    file.write_all(csv_rows(frame.name(), records).as_bytes())?;
    info!("导出 {} 条记录到 {}", records.len(), path.display());
    self.written.insert(path);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::DetectionRecord;
  use image::RgbImage;

  #[test]
  fn exports_records_with_bom() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("out/findings.csv");
    let output = TableFileOutput::from_url(&Url::parse(&format!("csv://{}", path.display()))?)?;
    let frame = ImageFrame::from_rgb_image("ad", RgbImage::new(2, 2))?;
    let result = CheckResult::Detections(vec![DetectionRecord {
      text: "No.1".into(),
      kind: "景表法".into(),
      ..Default::default()
    }]);

    output.render_result(&frame, &result)?;

    let bytes = std::fs::read(&path)?;
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(bytes)?;
    assert!(text.contains("ad,No.1,景表法,,"));
    Ok(())
  }

  fn finding(text: &str) -> CheckResult {
    CheckResult::Detections(vec![DetectionRecord {
      text: text.into(),
      kind: "表記".into(),
      ..Default::default()
    }])
  }

  #[test]
  fn single_file_target_collects_rows_from_every_frame() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("findings.csv");
    std::fs::write(&path, "stale")?;
    let output = TableFileOutput::from_url(&Url::parse(&format!("csv://{}", path.display()))?)?;
    let first = ImageFrame::from_rgb_image("first", RgbImage::new(2, 2))?;
    let second = ImageFrame::from_rgb_image("second", RgbImage::new(2, 2))?;

    output.render_result(&first, &finding("一枚目の指摘"))?;
    output.render_result(&second, &finding("二枚目の指摘"))?;

    let text = std::fs::read_to_string(&path)?;
    assert!(!text.contains("stale"));
    assert_eq!(text.matches('\u{feff}').count(), 1);
    assert_eq!(text.matches("画像,対象箇所（原文）").count(), 1);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "first,一枚目の指摘,表記,,");
    assert_eq!(lines[2], "second,二枚目の指摘,表記,,");
    Ok(())
  }

  #[test]
  fn new_output_starts_a_fresh_file() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("findings.csv");
    let url = Url::parse(&format!("csv://{}", path.display()))?;
    let frame = ImageFrame::from_rgb_image("ad", RgbImage::new(2, 2))?;

    TableFileOutput::from_url(&url)?.render_result(&frame, &finding("前回"))?;
    TableFileOutput::from_url(&url)?.render_result(&frame, &finding("今回"))?;

    let text = std::fs::read_to_string(&path)?;
    assert!(!text.contains("前回"));
    assert!(text.contains("ad,今回"));
    Ok(())
  }

  #[test]
  fn unparsed_results_are_not_exported() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("findings.csv");
    let output = TableFileOutput::from_url(&Url::parse(&format!("csv://{}", path.display()))?)?;
    let frame = ImageFrame::from_rgb_image("ad", RgbImage::new(2, 2))?;
    let result = CheckResult::Unparsed {
      raw: "oops".into(),
      reason: "bad".into(),
    };
    output.render_result(&frame, &result)?;
    assert!(!path.exists());
    Ok(())
  }
}
