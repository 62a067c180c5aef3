// 该文件是 Adproof （广告校对） 项目的一部分。
// src/frame.rs - 待检查图像帧定义
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

use image::{ImageFormat, ImageResult, RgbImage};

const DEFAULT_MIME_TYPE: &str = "image/jpeg";
const DEFAULT_FRAME_NAME: &str = "frame";

/// 一张待检查的广告图像。
///
/// 同时保存解码后的像素（用于绘制标注）与原始编码字节（用于上传给模型），
/// 两者描述同一张图像。
#[derive(Debug, Clone)]
pub struct ImageFrame {
  name: String,
  image: RgbImage,
  encoded: Box<[u8]>,
  mime_type: &'static str,
}

impl ImageFrame {
  /// 从编码后的字节构造帧，格式由内容推断
  pub fn decode(name: impl Into<String>, encoded: Vec<u8>) -> ImageResult<Self> {
    let format = image::guess_format(&encoded)?;
    let image = image::load_from_memory_with_format(&encoded, format)?.to_rgb8();

    Ok(Self {
      name: name.into(),
      image,
      encoded: encoded.into_boxed_slice(),
      mime_type: mime_type_of(format),
    })
  }

  /// 仅由像素构造帧，上传时会重新编码为 PNG
  pub fn from_rgb_image(name: impl Into<String>, image: RgbImage) -> ImageResult<Self> {
    let mut encoded = std::io::Cursor::new(Vec::new());
    image.write_to(&mut encoded, ImageFormat::Png)?;

    Ok(Self {
      name: name.into(),
      image,
      encoded: encoded.into_inner().into_boxed_slice(),
      mime_type: mime_type_of(ImageFormat::Png),
    })
  }

  pub fn name(&self) -> &str {
    if self.name.is_empty() {
      DEFAULT_FRAME_NAME
    } else {
      &self.name
    }
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn encoded(&self) -> &[u8] {
    &self.encoded
  }

  pub fn mime_type(&self) -> &'static str {
    self.mime_type
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }
}

fn mime_type_of(format: ImageFormat) -> &'static str {
  match format {
    ImageFormat::Png => "image/png",
    ImageFormat::Jpeg => "image/jpeg",
    ImageFormat::WebP => "image/webp",
    _ => DEFAULT_MIME_TYPE,
  }
}
