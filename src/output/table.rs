// 该文件是 Adproof （广告校对） 项目的一部分。
// src/output/table.rs - 检查记录的表格形式
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

use chrono::{DateTime, Local};

use crate::model::{CheckResult, DetectionRecord};

/// 字段名与表头的对应，坐标不输出
pub const COLUMNS: [(&str, &str); 4] = [
  ("text", "対象箇所（原文）"),
  ("type", "種別"),
  ("reason", "NG理由・指摘内容"),
  ("fix", "修正案"),
];

/// 仅用于 CSV，区分同一文件中不同图像的记录
pub const IMAGE_COLUMN: &str = "画像";

const UTF8_BOM: &str = "\u{feff}";
const CSV_LINE_END: &str = "\r\n";
const NO_FINDINGS: &str = "指摘事項はありません。";

fn cells(record: &DetectionRecord) -> [&str; 4] {
  [&record.text, &record.kind, &record.reason, &record.fix]
}

fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\r', '\n']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

/// 带 BOM 的 UTF-8 CSV，便于表格软件直接打开
/// CSV 文件开头：BOM 与表头，每个文件只写一次
pub fn csv_header() -> String {
  let mut out = String::from(UTF8_BOM);
  let header: Vec<String> = std::iter::once(IMAGE_COLUMN)
    .chain(COLUMNS.iter().map(|(_, title)| *title))
    .map(csv_field)
    .collect();
  out.push_str(&header.join(","));
  out.push_str(CSV_LINE_END);
  out
}

/// 每条记录一行，首列为图像名
pub fn csv_rows(name: &str, records: &[DetectionRecord]) -> String {
  let mut out = String::new();
  for record in records {
    let row: Vec<String> = std::iter::once(name)
      .chain(cells(record))
      .map(csv_field)
      .collect();
    out.push_str(&row.join(","));
    out.push_str(CSV_LINE_END);
  }
  out
}

fn markdown_cell(value: &str) -> String {
  value
    .trim()
    .replace('|', "\\|")
    .replace("\r\n", "<br>")
    .replace('\n', "<br>")
}

pub fn to_markdown_table(records: &[DetectionRecord]) -> String {
  let titles: Vec<&str> = COLUMNS.iter().map(|(_, title)| *title).collect();
  let mut out = format!("| {} |\n", titles.join(" | "));
  out.push_str(&format!("|{}\n", " :--- |".repeat(COLUMNS.len())));
  for record in records {
    let row: Vec<String> = cells(record).iter().map(|cell| markdown_cell(cell)).collect();
    out.push_str(&format!("| {} |\n", row.join(" | ")));
  }
  out
}

/// 单张图像的 Markdown 报告
pub fn render_markdown(
  name: &str,
  result: &CheckResult,
  checked_at: Option<&DateTime<Local>>,
) -> String {
  let mut out = format!("## {name}\n\n");
  if let Some(time) = checked_at {
    out.push_str(&format!("チェック日時: {}\n\n", time.format("%Y-%m-%d %H:%M:%S")));
  }
  match result {
    CheckResult::Report(text) => {
      out.push_str(text.trim());
      out.push('\n');
    }
    CheckResult::Detections(records) if records.is_empty() => {
      out.push_str(NO_FINDINGS);
      out.push('\n');
    }
    CheckResult::Detections(records) => {
      out.push_str(&to_markdown_table(records));
    }
    CheckResult::Unparsed { raw, reason } => {
      out.push_str(&format!(
        "> モデルの応答を解釈できませんでした（{reason}）。元の応答を以下に示します。\n\n"
      ));
      out.push_str("```text\n");
      out.push_str(raw.trim_end());
      out.push_str("\n```\n");
    }
  }
  out
}
