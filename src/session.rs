// 该文件是 Adproof （广告校对） 项目的一部分。
// src/session.rs - 会话密码门
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
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
  #[error("会话已锁定，请先输入密码")]
  Locked,
  #[error("密码错误")]
  WrongPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Locked,
  Unlocked,
}

/// 每个会话各自持有的密码门，只有 Locked -> Unlocked 一种转换
#[derive(Debug, Clone)]
pub struct SessionGate {
  password: Option<String>,
  state: SessionState,
}

impl SessionGate {
  /// 未配置密码（或为空）时会话直接解锁
  pub fn new(password: Option<String>) -> Self {
    let password = password.filter(|p| !p.is_empty());
    let state = if password.is_some() {
      SessionState::Locked
    } else {
      SessionState::Unlocked
    };
    Self { password, state }
  }

  pub fn open() -> Self {
    Self::new(None)
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn unlock(&mut self, attempt: &str) -> Result<(), SessionError> {
    if self.state == SessionState::Unlocked {
      return Ok(());
    }
    match &self.password {
      Some(expected) if expected == attempt => {
        info!("会话已解锁");
        self.state = SessionState::Unlocked;
        Ok(())
      }
      _ => {
        warn!("密码错误，会话保持锁定");
        Err(SessionError::WrongPassword)
      }
    }
  }

  pub fn ensure_unlocked(&self) -> Result<(), SessionError> {
    match self.state {
      SessionState::Unlocked => Ok(()),
      SessionState::Locked => Err(SessionError::Locked),
    }
  }
}

impl Default for SessionGate {
  fn default() -> Self {
    Self::open()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_password_means_unlocked() {
    assert_eq!(SessionGate::new(None).state(), SessionState::Unlocked);
    assert_eq!(SessionGate::new(Some(String::new())).state(), SessionState::Unlocked);
    assert!(SessionGate::default().ensure_unlocked().is_ok());
  }

  #[test]
  fn wrong_password_keeps_session_locked() {
    let mut gate = SessionGate::new(Some("secret".into()));
    assert_eq!(gate.ensure_unlocked(), Err(SessionError::Locked));
    assert_eq!(gate.unlock("guess"), Err(SessionError::WrongPassword));
    assert_eq!(gate.state(), SessionState::Locked);

    assert_eq!(gate.unlock("secret"), Ok(()));
    assert_eq!(gate.state(), SessionState::Unlocked);
    assert!(gate.ensure_unlocked().is_ok());
  }

  #[test]
  fn sessions_do_not_share_state() {
    let mut first = SessionGate::new(Some("secret".into()));
    let second = first.clone();
    first.unlock("secret").unwrap();
    assert_eq!(first.state(), SessionState::Unlocked);
    assert_eq!(second.state(), SessionState::Locked);
  }
}
