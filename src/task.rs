// 该文件是 Adproof （广告校对） 项目的一部分。
// src/task.rs - 检查任务
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

use tracing::{error, info, warn};

use crate::{
  frame::ImageFrame,
  model::{CheckResult, Model},
  output::Render,
  session::SessionGate,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<TaskSummary, Self::Error>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
  /// 成功完成的检查次数
  pub checked: usize,
  /// 上游调用或输出失败的次数
  pub failed: usize,
  /// 结构化结果无法解析的次数
  pub unparsed: usize,
  /// 检查记录总数
  pub findings: usize,
}

impl TaskSummary {
  fn record(&mut self, result: &CheckResult) {
    self.checked += 1;
    match result {
      CheckResult::Detections(records) => self.findings += records.len(),
      CheckResult::Unparsed { .. } => self.unparsed += 1,
      CheckResult::Report(_) => {}
    }
  }
}

fn check_frame<M, O, ME, RE>(
  frame: &ImageFrame,
  model: &M,
  output: &O,
) -> anyhow::Result<CheckResult>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = ImageFrame, Output = CheckResult, Error = ME>,
  O: Render<ImageFrame, CheckResult, Error = RE>,
{
  let now = std::time::Instant::now();
  let result = model.infer(frame)?;
  info!("「{}」检查完成，耗时: {:.2?}", frame.name(), now.elapsed());
  if let CheckResult::Unparsed { reason, .. } = &result {
    warn!("「{}」的模型应答无法解析: {}", frame.name(), reason);
  }
  output.render_result(frame, &result)?;
  Ok(result)
}

/// 只检查第一张图像，任何错误直接返回
pub struct OneShotTask {
  session: SessionGate,
}

impl OneShotTask {
  pub fn new(session: SessionGate) -> Self {
    Self { session }
  }
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<ImageFrame, IE>>,
  M: Model<Input = ImageFrame, Output = CheckResult, Error = ME>,
  O: Render<ImageFrame, CheckResult, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    self.session.ensure_unlocked()?;
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    let result = check_frame(&frame, &model, &output)?;

    let mut summary = TaskSummary::default();
    summary.record(&result);
    Ok(summary)
  }
}

/// 依次检查所有图像，单张图像读取或检查失败不影响后续检查
#[derive(Debug)]
pub struct BatchTask {
  session: SessionGate,
  frame_number: Option<usize>,
}

impl BatchTask {
  pub fn new(session: SessionGate) -> Self {
    Self {
      session,
      frame_number: None,
    }
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<ImageFrame, IE>>,
  M: Model<Input = ImageFrame, Output = CheckResult, Error = ME>,
  O: Render<ImageFrame, CheckResult, Error = RE>,
> Task<I, M, O> for BatchTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    self.session.ensure_unlocked()?;
    info!("开始任务...");

    let mut summary = TaskSummary::default();
    for (index, frame) in input.enumerate() {
      if self.frame_number.is_some_and(|n| index >= n) {
        info!("达到指定图像数 {}, 退出任务循环", index);
        break;
      }
      let frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
          error!("第 {} 张图像读取失败: {}", index + 1, e);
          summary.failed += 1;
          continue;
        }
      };
      info!("检查第 {} 张图像: {}", index + 1, frame.name());
      match check_frame(&frame, &model, &output) {
        Ok(result) => summary.record(&result),
        Err(e) => {
          error!("「{}」检查失败: {:#}", frame.name(), e);
          summary.failed += 1;
        }
      }
    }

    info!(
      "任务完成: 成功 {} / 失败 {} / 无法解析 {} / 指摘 {}",
      summary.checked, summary.failed, summary.unparsed, summary.findings
    );
    Ok(summary)
  }
}
