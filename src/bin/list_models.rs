// 该文件是 Adproof （广告校对） 项目的一部分。
// src/bin/list_models.rs - 列出上游可用模型
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

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use url::Url;

use adproof::{
  FromUrl, FromUrlWithScheme,
  model::{ModelCatalog, ModelDescriptor, selector::select_best_model},
};
#[cfg(feature = "gemini")]
use adproof::model::GeminiModelBuilder;
#[cfg(feature = "openai")]
use adproof::model::OpenAiModelBuilder;

/// 列出上游可用模型，并标出自动选择的结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 服务商地址，例如 gemini://auto 或 openai://auto
  #[arg(long, default_value = "gemini://auto", value_name = "MODEL")]
  pub model: Url,

  /// 上游 API 密钥，缺省读取各服务商的环境变量
  #[arg(long, env = "ADPROOF_API_KEY", hide_env_values = true)]
  pub api_key: Option<String>,

  /// 同时列出不支持内容生成的模型
  #[arg(long)]
  pub all: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("服务商: {}", args.model.scheme());

  let models: Vec<ModelDescriptor> = match args.model.scheme() {
    #[cfg(feature = "gemini")]
    GeminiModelBuilder::SCHEME => GeminiModelBuilder::from_url(&args.model)?
      .with_api_key(args.api_key.clone())
      .catalog()?
      .list_models()?,
    #[cfg(feature = "openai")]
    OpenAiModelBuilder::SCHEME => OpenAiModelBuilder::from_url(&args.model)?
      .with_api_key(args.api_key.clone())
      .catalog()?
      .list_models()?,
    other => bail!("不支持的模型方案: {}", other),
  };

  let selected = select_best_model(&models);
  for model in &models {
    if !args.all && !model.supports_generation {
      continue;
    }
    let marker = if selected.is_some_and(|s| s.name == model.name) {
      "*"
    } else {
      " "
    };
    let flag = if model.supports_generation { "generate" } else { "-" };
    println!("{} {:<48} {}", marker, model.name, flag);
  }

  match selected {
    Some(model) => info!("自动选择: {}", model.name),
    None => bail!("没有可用的模型"),
  }

  Ok(())
}
