// 该文件是 Adproof （广告校对） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{info, warn};

use adproof::{
  FromUrl, FromUrlWithScheme,
  frame::ImageFrame,
  input::InputChain,
  model::{CheckResult, Model},
  output::OutputSet,
  session::SessionGate,
  task::{BatchTask, OneShotTask, Task, TaskSummary},
};
#[cfg(feature = "gemini")]
use adproof::model::GeminiModelBuilder;
#[cfg(feature = "openai")]
use adproof::model::OpenAiModelBuilder;

fn run_checks<ME, M>(
  args: &args::Args,
  session: SessionGate,
  input: InputChain,
  model: M,
  output: OutputSet,
) -> Result<TaskSummary>
where
  ME: std::error::Error + Sync + Send + 'static,
  M: Model<Input = ImageFrame, Output = CheckResult, Error = ME>,
{
  if args.oneshot {
    info!("单次模式: 只检查第一张图像");
    OneShotTask::new(session).run_task(input, model, output)
  } else {
    BatchTask::new(session)
      .with_frame_number(args.frame_limit())
      .run_task(input, model, output)
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型地址: {}", args.model);
  info!("输入来源: {} 个", args.input.len());
  for output in &args.output {
    info!("输出: {}", output);
  }

  let mut session = SessionGate::new(args.access_password.clone());
  if let Some(attempt) = &args.password {
    session.unlock(attempt)?;
  }

  let input = InputChain::from_urls(&args.input)?;
  let output = OutputSet::from_urls(&args.output)?;
  let rules = args.additional_rules()?;
  let template = args.template()?;

  let summary: TaskSummary = match args.model.scheme() {
    #[cfg(feature = "gemini")]
    GeminiModelBuilder::SCHEME => {
      let model = GeminiModelBuilder::from_url(&args.model)?
        .with_api_key(args.api_key.clone())
        .with_template(template)
        .with_rules(rules)
        .build()?;
      info!("使用模型: {} ({:?})", model.model_name(), model.mode());
      run_checks(&args, session, input, model, output)?
    }
    #[cfg(feature = "openai")]
    OpenAiModelBuilder::SCHEME => {
      let model = OpenAiModelBuilder::from_url(&args.model)?
        .with_api_key(args.api_key.clone())
        .with_template(template)
        .with_rules(rules)
        .build()?;
      info!("使用模型: {} ({:?})", model.model_name(), model.mode());
      run_checks(&args, session, input, model, output)?
    }
    other => bail!("不支持的模型方案: {}", other),
  };

  if summary.unparsed > 0 {
    warn!("{} 张图像的模型应答无法解析，已输出原文", summary.unparsed);
  }
  if summary.failed > 0 {
    bail!("{} 张图像检查失败", summary.failed);
  }
  info!("处理完成! 共检查 {} 张，指摘 {} 处", summary.checked, summary.findings);

  Ok(())
}
