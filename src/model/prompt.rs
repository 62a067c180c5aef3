// 该文件是 Adproof （广告校对） 项目的一部分。
// src/model/prompt.rs - 提示词模板
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

use tracing::warn;

use crate::model::ReviewMode;

/// 模板中唯一的替换点
pub const RULES_PLACEHOLDER: &str = "{additional_rules}";

const EMPTY_RULES: &str = "なし";

const REPORT_TEMPLATE: &str = "\
あなたはプロの校正者かつ薬機法・景表法の専門家です。
画像内のテキストを読み取り、以下の形式でマークダウンの表を出力してください。

【チェック観点】
1. 誤字脱字・文法ミス・不自然な日本語
2. 薬機法（医薬品医療機器等法）・景品表示法に抵触する恐れのある表現（特に「効果の保証」「最大級表現」など）

【追加ルール】
{additional_rules}

【出力フォーマット】
| 対象箇所（原文） | 種別（薬機法/誤字など） | NG理由・指摘内容 | 修正案 |
| :--- | :--- | :--- | :--- |

※最後に総評として、全体的なリスク度合い（低・中・高）とアドバイスを記述してください。
";

const DETECT_TEMPLATE: &str = "\
あなたはプロの校正者かつ薬機法・景表法の専門家です。
画像内のテキストを読み取り、問題のある箇所をすべて指摘してください。

【チェック観点】
1. 誤字脱字・文法ミス・不自然な日本語
2. 薬機法（医薬品医療機器等法）・景品表示法に抵触する恐れのある表現（特に「効果の保証」「最大級表現」など）

【追加ルール】
{additional_rules}

【出力フォーマット】
JSON 配列のみを出力してください。説明文やマークダウンは不要です。
各要素は次のキーを持つオブジェクトです。
- \"text\": 対象箇所（原文）
- \"type\": 種別（薬機法/景表法/誤字/表現など）
- \"reason\": NG理由・指摘内容
- \"fix\": 修正案
- \"box_2d\": 対象箇所を囲む [ymin, xmin, ymax, xmax]（画像サイズを 0〜1000 に正規化した整数）

問題がない場合は [] を出力してください。
";

/// 发给模型的用户消息
pub const USER_INSTRUCTION: &str = "この画像の文章を校正してください。";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
  template: String,
}

impl PromptTemplate {
  pub fn builtin(mode: ReviewMode) -> Self {
    let template = match mode {
      ReviewMode::Report => REPORT_TEMPLATE,
      ReviewMode::Detect => DETECT_TEMPLATE,
    };
    Self {
      template: template.to_string(),
    }
  }

  pub fn custom(template: impl Into<String>) -> Self {
    let template = template.into();
    if !template.contains(RULES_PLACEHOLDER) {
      warn!("提示词模板中没有 {} 替换点，追加规则将被忽略", RULES_PLACEHOLDER);
    }
    Self { template }
  }

  pub fn as_str(&self) -> &str {
    &self.template
  }

  /// 代入追加规则，空规则渲染为「なし」
  pub fn render(&self, additional_rules: &str) -> String {
    let rules = additional_rules.trim();
    let rules = if rules.is_empty() { EMPTY_RULES } else { rules };
    self.template.replace(RULES_PLACEHOLDER, rules)
  }
}
