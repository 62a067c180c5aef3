// 该文件是 Adproof （广告校对） 项目的一部分。
// src/output/draw.rs - 检查结果标注绘制
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use tracing::debug;

use crate::{
  frame::ImageFrame,
  model::{DetectionRecord, PixelRect},
};

const BOX_COLOR: [u8; 3] = [255, 0, 0]; // 红色
const BOX_STROKE_WIDTH: u32 = 5;

pub struct Draw {
  color: Rgb<u8>,
  stroke_width: u32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      color: Rgb(BOX_COLOR),
      stroke_width: BOX_STROKE_WIDTH,
    }
  }
}

impl Draw {
  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = Rgb(color);
    self
  }

  pub fn with_stroke_width(mut self, stroke_width: u32) -> Self {
    self.stroke_width = stroke_width.max(1);
    self
  }

  // 边框自外沿向内加粗，超出图像的部分由 imageproc 裁剪
  fn draw_rect(&self, image: &mut RgbImage, rect: PixelRect) {
    for inset in 0..self.stroke_width as i32 {
      let left = rect.left + inset;
      let top = rect.top + inset;
      let right = rect.right - inset;
      let bottom = rect.bottom - inset;
      if left > right || top > bottom {
        break;
      }
      let rect = Rect::at(left, top).of_size((right - left) as u32 + 1, (bottom - top) as u32 + 1);
      draw_hollow_rect_mut(image, rect, self.color);
    }
  }
}

pub trait DrawDetectionOnImage {
  /// 就地绘制，返回实际画出的框数
  fn draw_detections_on_image(&self, image: &mut RgbImage, records: &[DetectionRecord]) -> usize;
}

impl DrawDetectionOnImage for Draw {
  fn draw_detections_on_image(&self, image: &mut RgbImage, records: &[DetectionRecord]) -> usize {
    let (width, height) = image.dimensions();
    let mut drawn = 0;
    for record in records {
      let Some(bbox) = record.bbox else {
        continue;
      };
      let rect = bbox.to_pixel_rect(width, height);
      debug!("标注 「{}」 于 {:?}", record.text, rect);
      self.draw_rect(image, rect);
      drawn += 1;
    }
    drawn
  }
}

pub trait DrawDetectionOnFrame {
  fn draw_detection(&self, frame: &ImageFrame, records: &[DetectionRecord]) -> RgbImage;
}

impl<D: DrawDetectionOnImage> DrawDetectionOnFrame for D {
  fn draw_detection(&self, frame: &ImageFrame, records: &[DetectionRecord]) -> RgbImage {
    annotate_with(self, frame.image(), records)
  }
}

fn annotate_with<D: DrawDetectionOnImage + ?Sized>(
  draw: &D,
  image: &RgbImage,
  records: &[DetectionRecord],
) -> RgbImage {
  let mut output = image.clone();
  draw.draw_detections_on_image(&mut output, records);
  output
}

/// 在图像副本上用默认样式（红色、5 像素）画出所有有效的框，输入图像保持不变
pub fn annotate(image: &RgbImage, records: &[DetectionRecord]) -> RgbImage {
  annotate_with(&Draw::default(), image, records)
}
