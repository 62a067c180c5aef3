// 该文件是 Adproof （广告校对） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use adproof::model::prompt::PromptTemplate;

/// Adproof 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址
  /// 支持格式:
  /// - gemini://auto?mode=detect（自动选择 flash 模型）
  /// - gemini://gemini-1.5-pro?mode=report
  /// - openai://gpt-4o?mode=report
  #[arg(long, default_value = "gemini://auto?mode=detect", value_name = "MODEL")]
  pub model: Url,

  /// 输入图像，可重复指定，例如 image:///path/to/ad.png
  #[arg(long, required = true, value_name = "SOURCE")]
  pub input: Vec<Url>,

  /// 输出，可重复指定
  /// 支持格式:
  /// - stdout:
  /// - markdown:///path/report.md
  /// - csv:///path/findings.csv
  /// - image:///path/annotated.png
  /// 以 / 结尾的路径视为目录
  #[arg(long, default_value = "stdout:", value_name = "OUTPUT")]
  pub output: Vec<Url>,

  /// 追加规则（任意），例如「致します」は「いたします」に統一
  #[arg(long, value_name = "TEXT")]
  pub rules: Option<String>,

  /// 从文件读取追加规则
  #[arg(long, value_name = "FILE", conflicts_with = "rules")]
  pub rules_file: Option<PathBuf>,

  /// 自定义提示词模板，{additional_rules} 为替换点
  #[arg(long, value_name = "FILE")]
  pub prompt_template: Option<PathBuf>,

  /// 上游 API 密钥，缺省读取各服务商的环境变量
  #[arg(long, env = "ADPROOF_API_KEY", hide_env_values = true)]
  pub api_key: Option<String>,

  /// 访问密码（设置后需要 --password 才能检查）
  #[arg(long, env = "ADPROOF_PASSWORD", hide_env_values = true)]
  pub access_password: Option<String>,

  /// 本次会话输入的密码
  #[arg(long)]
  pub password: Option<String>,

  /// 只检查第一张图像，读取或检查失败时直接报错退出
  #[arg(long)]
  pub oneshot: bool,

  /// 最大检查图像数（0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_images: usize,
}

impl Args {
  pub fn additional_rules(&self) -> Result<String> {
    match (&self.rules, &self.rules_file) {
      (Some(rules), _) => Ok(rules.clone()),
      (None, Some(path)) => std::fs::read_to_string(path)
        .with_context(|| format!("无法读取规则文件: {}", path.display())),
      (None, None) => Ok(String::new()),
    }
  }

  pub fn template(&self) -> Result<Option<PromptTemplate>> {
    self
      .prompt_template
      .as_ref()
      .map(|path| {
        std::fs::read_to_string(path)
          .map(PromptTemplate::custom)
          .with_context(|| format!("无法读取提示词模板: {}", path.display()))
      })
      .transpose()
  }

  pub fn frame_limit(&self) -> Option<usize> {
    (self.max_images > 0).then_some(self.max_images)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn oneshot_flag_selects_single_image_mode() -> anyhow::Result<()> {
    let args = Args::try_parse_from(["adproof", "--input", "image:///ads/a.png", "--oneshot"])?;
    assert!(args.oneshot);
    assert_eq!(args.frame_limit(), None);

    let args = Args::try_parse_from([
      "adproof",
      "--input",
      "image:///ads/a.png",
      "--max-images",
      "3",
    ])?;
    assert!(!args.oneshot);
    assert_eq!(args.frame_limit(), Some(3));
    assert_eq!(args.output, vec![Url::parse("stdout:")?]);
    Ok(())
  }
}
