// 该文件是 Adproof （广告校对） 项目的一部分。
// src/input.rs - 图像输入
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

use thiserror::Error;

use crate::{FromUrl, FromUrlWithScheme, frame::ImageFrame};

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("图像文件输入错误: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() == ImageFileInput::SCHEME {
      let input = ImageFileInput::from_url(url)?;
      return Ok(InputWrapper::ReadImageFile(input));
    }
    Err(InputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Iterator for InputWrapper {
  type Item = Result<ImageFrame, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::ReadImageFile(input) => input.next().map(|r| r.map_err(InputError::from)),
    }
  }
}

/// 依次读取多个输入来源的帧；构造时只检查地址，读取失败按帧返回
pub struct InputChain {
  inputs: std::collections::VecDeque<InputWrapper>,
}

impl InputChain {
  pub fn from_urls<'u>(urls: impl IntoIterator<Item = &'u url::Url>) -> Result<Self, InputError> {
    let inputs = urls
      .into_iter()
      .map(InputWrapper::from_url)
      .collect::<Result<_, _>>()?;
    Ok(Self { inputs })
  }

  pub fn len(&self) -> usize {
    self.inputs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inputs.is_empty()
  }
}

impl Iterator for InputChain {
  type Item = Result<ImageFrame, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(input) = self.inputs.front_mut() {
      if let Some(frame) = input.next() {
        return Some(frame);
      }
      self.inputs.pop_front();
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;
  use url::Url;

  #[test]
  fn unreadable_input_does_not_stop_the_chain() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let good = temp.path().join("good.png");
    RgbImage::new(3, 3).save(&good)?;
    let urls = [
      Url::parse(&format!("image://{}", temp.path().join("missing.png").display()))?,
      Url::parse(&format!("image://{}", good.display()))?,
    ];

    let mut chain = InputChain::from_urls(&urls)?;
    assert_eq!(chain.len(), 2);
    assert!(matches!(chain.next(), Some(Err(InputError::ImageFileInputError(_)))));
    let frame = chain.next().ok_or_else(|| anyhow::anyhow!("no frame"))??;
    assert_eq!(frame.name(), "good");
    assert!(chain.next().is_none());
    Ok(())
  }

  #[test]
  fn unknown_scheme_is_rejected_up_front() -> anyhow::Result<()> {
    let urls = [Url::parse("https://example.com/ad.png")?];
    assert!(matches!(
      InputChain::from_urls(&urls),
      Err(InputError::SchemeMismatch(scheme)) if scheme == "https"
    ));
    Ok(())
  }
}
