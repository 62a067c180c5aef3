// 该文件是 Adproof （广告校对） 项目的一部分。
// src/response.rs - 模型返回文本的结构化提取
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

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{BoundingBox, DetectionRecord};

const CODE_FENCE: &str = "```";

#[derive(Error, Debug)]
pub enum ExtractError {
  #[error("JSON 解析错误: {0}")]
  InvalidJson(#[from] serde_json::Error),
  #[error("期望 JSON 数组，实际为 {0}")]
  NotAnArray(&'static str),
}

/// 去掉首尾的代码围栏（以及开头围栏上的语言标记），可重复调用
pub fn strip_code_fence(raw: &str) -> &str {
  let mut text = raw.trim();
  loop {
    let before = text;
    if let Some(rest) = text.strip_prefix(CODE_FENCE) {
      // 语言标记与围栏在同一行
      text = match rest.split_once('\n') {
        Some((tag, body)) if is_language_tag(tag) => body,
        Some(_) => rest,
        None if is_language_tag(rest) => "",
        None => rest,
      };
    }
    if let Some(rest) = text.trim_end().strip_suffix(CODE_FENCE) {
      text = rest;
    }
    text = text.trim();
    if text == before {
      return text;
    }
  }
}

fn is_language_tag(tag: &str) -> bool {
  tag
    .trim()
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 从模型返回的文本中提取检查记录
pub fn extract_json_array(raw: &str) -> Result<Vec<DetectionRecord>, ExtractError> {
  let body = strip_code_fence(raw);
  let value: Value = serde_json::from_str(body)?;
  let Value::Array(items) = value else {
    return Err(ExtractError::NotAnArray(json_kind(&value)));
  };

  let mut records = Vec::with_capacity(items.len());
  for (index, item) in items.iter().enumerate() {
    match item.as_object() {
      Some(_) => records.push(record_from_json(item)),
      None => warn!("第 {} 项不是 JSON 对象，已跳过: {}", index, json_kind(item)),
    }
  }
  debug!("提取到 {} 条记录", records.len());
  Ok(records)
}

fn record_from_json(item: &Value) -> DetectionRecord {
  DetectionRecord {
    text: text_field(item, "text"),
    kind: text_field(item, "type"),
    reason: text_field(item, "reason"),
    fix: text_field(item, "fix"),
    bbox: item.get("box_2d").and_then(bounding_box_from_json),
  }
}

fn text_field(item: &Value, key: &str) -> String {
  match item.get(key) {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(text)) => text.clone(),
    Some(other) => other.to_string(),
  }
}

/// 仅接受 4 个数值且满足取值约束的数组
pub fn bounding_box_from_json(value: &Value) -> Option<BoundingBox> {
  let coords = value.as_array()?;
  let [ymin, xmin, ymax, xmax] = coords.as_slice() else {
    return None;
  };
  BoundingBox::new(
    ymin.as_f64()?,
    xmin.as_f64()?,
    ymax.as_f64()?,
    xmax.as_f64()?,
  )
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn fenced_payload_yields_record_with_box() -> anyhow::Result<()> {
    let raw = "```json\n[{\"text\":\"a\",\"type\":\"typo\",\"reason\":\"r\",\"fix\":\"f\",\"box_2d\":[100,100,200,200]}]\n```";
    let records = extract_json_array(raw)?;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.text, "a");
    assert_eq!(record.kind, "typo");
    assert_eq!(record.reason, "r");
    assert_eq!(record.fix, "f");
    assert_eq!(record.bbox, BoundingBox::new(100.0, 100.0, 200.0, 200.0));
    assert!(record.bbox.is_some());
    Ok(())
  }

  #[test]
  fn not_json_is_a_parse_error() {
    assert!(matches!(
      extract_json_array("not json"),
      Err(ExtractError::InvalidJson(_))
    ));
  }

  #[test]
  fn non_array_is_a_parse_error() {
    assert!(matches!(
      extract_json_array("{\"text\": \"a\"}"),
      Err(ExtractError::NotAnArray("object"))
    ));
  }

  #[test]
  fn fence_stripping_is_idempotent() {
    let inputs = [
      "```json\n[1, 2]\n```",
      "```\n[]\n```",
      "  [ {\"text\": \"x\"} ]  ",
      "```json\n```json\n[]\n```\n```",
      "```[]```",
      "",
    ];
    for input in inputs {
      let once = strip_code_fence(input);
      assert_eq!(strip_code_fence(once), once, "input: {input:?}");
    }
    assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
    assert_eq!(strip_code_fence("```[]```"), "[]");
    assert_eq!(strip_code_fence("[]"), "[]");
  }

  #[test]
  fn missing_fields_default_to_empty_and_order_is_kept() -> anyhow::Result<()> {
    let raw = json!([
      {"text": "first", "box_2d": null},
      {"type": "薬機法", "reason": 3},
      {"text": "third", "box_2d": [0, 0, 10, 10]}
    ])
    .to_string();
    let records = extract_json_array(&raw)?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].text, "first");
    assert_eq!(records[0].kind, "");
    assert!(records[0].bbox.is_none());
    assert_eq!(records[1].text, "");
    assert_eq!(records[1].kind, "薬機法");
    assert_eq!(records[1].reason, "3");
    assert_eq!(records[2].text, "third");
    assert!(records[2].bbox.is_some());
    Ok(())
  }

  #[test]
  fn malformed_boxes_degrade_to_none() {
    let cases = [
      json!([1, 2, 3]),
      json!([1, 2, 3, 4, 5]),
      json!([1, "2", 3, 4]),
      json!([-5, 0, 10, 10]),
      json!([0, 0, 1001, 10]),
      json!([50, 0, 10, 10]),
      json!("0,0,10,10"),
      json!({"ymin": 0}),
    ];
    for case in cases {
      assert!(bounding_box_from_json(&case).is_none(), "case: {case}");
    }
    assert!(bounding_box_from_json(&json!([0.5, 1, 999.5, 1000])).is_some());
  }

  #[test]
  fn non_object_items_are_skipped() -> anyhow::Result<()> {
    let records = extract_json_array("[1, {\"text\": \"kept\"}, \"x\"]")?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "kept");
    Ok(())
  }
}
