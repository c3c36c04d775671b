//! 断点同步桥
//!
//! 每次变更后把启用的断点整体下发给引擎，成功后通知观察者。

use engine_trait::{EngineError, NativeEngine, WireBreakpoint};
use thiserror::Error;
use tracing::{debug, error};

use crate::store::BreakpointStore;

/// 同步错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("断点 {address:#x} 无法转换为引擎记录: {source}")]
    Convert {
        address: u32,
        #[source]
        source: EngineError,
    },
    #[error("引擎 {engine} 同步失败: {source}")]
    Engine {
        engine: String,
        #[source]
        source: EngineError,
    },
}

/// 观察者句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u32);

type Observer = Box<dyn FnMut()>;

/// 同步桥
pub struct SyncBridge<E: NativeEngine> {
    engine: E,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u32,
}

impl<E: NativeEngine> SyncBridge<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// 注册变更回调，回调不带任何参数，需要自行重新查询仓库
    pub fn subscribe(&mut self, observer: impl FnMut() + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        before != self.observers.len()
    }

    /// 下发启用的断点并通知观察者，返回下发的记录数
    ///
    /// 无法转换的记录（例如条件过长）记录日志后跳过，其余记录照常下发。
    pub fn publish(&mut self, store: &BreakpointStore) -> Result<usize, SyncError> {
        let records: Vec<WireBreakpoint> = store
            .enabled()
            .filter_map(|bp| match bp.to_wire() {
                Ok(record) => Some(record),
                Err(source) => {
                    let e = SyncError::Convert {
                        address: bp.address,
                        source,
                    };
                    error!("{}，跳过该断点", e);
                    None
                }
            })
            .collect();

        let count = records.len();
        self.engine
            .set_breakpoints(&records, count as u32)
            .map_err(|source| SyncError::Engine {
                engine: self.engine.name().to_string(),
                source,
            })
            .inspect_err(|e| error!("{}", e))?;
        debug!(engine = self.engine.name(), count, "断点已同步");

        for (_, observer) in self.observers.iter_mut() {
            observer();
        }
        Ok(count)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
