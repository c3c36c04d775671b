//! 记录型引擎：把每次下发的断点集合保存在内存里
//!
//! 引擎本身交给同步桥持有，外部通过 `Recording` 句柄观察下发结果。

use engine_trait::{check_count, EngineError, NativeEngine, WireBreakpoint};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Log {
    active: Vec<WireBreakpoint>,
    history: Vec<Vec<WireBreakpoint>>,
}

/// 记录结果的共享句柄
#[derive(Debug, Clone, Default)]
pub struct Recording {
    log: Rc<RefCell<Log>>,
}

impl Recording {
    /// 引擎当前生效的断点集合（最后一次下发的结果）
    pub fn active(&self) -> Vec<WireBreakpoint> {
        self.log.borrow().active.clone()
    }

    /// 成功下发的次数
    pub fn publish_count(&self) -> usize {
        self.log.borrow().history.len()
    }

    /// 每次成功下发的完整集合，按时间顺序
    pub fn history(&self) -> Vec<Vec<WireBreakpoint>> {
        self.log.borrow().history.clone()
    }
}

/// 记录型引擎
pub struct RecordingEngine {
    name: String,
    recording: Recording,
    failure: Option<String>,
}

impl RecordingEngine {
    /// 创建新的记录型引擎，同时返回观察句柄
    pub fn new(name: String) -> (Self, Recording) {
        let recording = Recording::default();
        let engine = Self {
            name,
            recording: recording.clone(),
            failure: None,
        };
        (engine, recording)
    }

    /// 创建一个总是拒绝下发的引擎
    pub fn failing(name: String, message: String) -> (Self, Recording) {
        let (mut engine, recording) = Self::new(name);
        engine.failure = Some(message);
        (engine, recording)
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new("recorder".to_string()).0
    }
}

impl NativeEngine for RecordingEngine {
    fn set_breakpoints(&mut self, records: &[WireBreakpoint], count: u32)
        -> Result<(), EngineError> {
        if let Some(message) = &self.failure {
            return Err(EngineError::Rejected(message.clone()));
        }
        check_count(records, count)?;

        let mut log = self.recording.log.borrow_mut();
        // 整体替换，不做增量合并
        log.active = records.to_vec();
        log.history.push(records.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
