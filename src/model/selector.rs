// 该文件是 Adproof （广告校对） 项目的一部分。
// src/model/selector.rs - 模型自动选择
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

use tracing::debug;

use crate::model::ModelDescriptor;

const FAST_TIER_MARKER: &str = "flash";
const EXPERIMENTAL_MARKER: &str = "exp";
const REDUCED_MARKER: &str = "8b";

/// 从候选模型中选出最合适的一个。
///
/// 不支持内容生成的候选会先被过滤掉，然后依次尝试：
/// 1. 含 `flash` 且既不含 `exp` 也不含 `8b`；
/// 2. 含 `flash`；
/// 3. 剩余候选中的第一个。
pub fn select_best_model(candidates: &[ModelDescriptor]) -> Option<&ModelDescriptor> {
  let usable: Vec<&ModelDescriptor> = candidates
    .iter()
    .filter(|model| model.supports_generation)
    .collect();

  let stable_fast = usable
    .iter()
    .find(|model| {
      model.name.contains(FAST_TIER_MARKER)
        && !model.name.contains(EXPERIMENTAL_MARKER)
        && !model.name.contains(REDUCED_MARKER)
    })
    .copied();
  if let Some(model) = stable_fast {
    debug!("选择稳定的 flash 模型: {}", model.name);
    return Some(model);
  }

  let any_fast = usable
    .iter()
    .find(|model| model.name.contains(FAST_TIER_MARKER))
    .copied();
  if let Some(model) = any_fast {
    debug!("没有稳定的 flash 模型，退而选择: {}", model.name);
    return Some(model);
  }

  usable.first().copied()
}
