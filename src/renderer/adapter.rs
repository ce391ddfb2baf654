//! 适配器选择模块
//!
//! 从平台枚举出的 GPU 适配器列表中选出用于创建设备的那一个。
//! 选择策略与原始 demo 一致：取专用显存最大的适配器，并列时取先枚举到的。
//!
//! 原始实现在列表为空时会解引用空句柄；这里把"无适配器"作为显式错误
//! 返回，设备创建永远不会拿到一个不存在的适配器。

use crate::core::error::{GraphicsError, Result};

/// 一个物理/虚拟 GPU 适配器的描述
///
/// 只保留选择策略需要的属性；适配器句柄本身由图形后端持有，
/// 设备创建之后不再保留。
#[derive(Debug, Clone)]
pub struct AdapterDescriptor {
    /// 适配器名称（用于日志）
    pub description: String,
    /// 专用显存大小（字节）
    pub dedicated_video_memory: u64,
}

impl AdapterDescriptor {
    pub fn new(description: impl Into<String>, dedicated_video_memory: u64) -> Self {
        Self {
            description: description.into(),
            dedicated_video_memory,
        }
    }
}

/// 选择专用显存最大的适配器，返回其在列表中的索引
///
/// # 参数
///
/// * `adapters` - 按枚举顺序排列的适配器描述列表
///
/// # 返回值
///
/// 显存最大的适配器索引；并列时返回先枚举到的那个。
/// 列表为空时返回 `GraphicsError::AdapterNotFound`。
pub fn select_adapter(adapters: &[AdapterDescriptor]) -> Result<usize> {
    let mut best: Option<(usize, u64)> = None;

    for (index, adapter) in adapters.iter().enumerate() {
        let better = match best {
            None => true,
            Some((_, best_memory)) => adapter.dedicated_video_memory > best_memory,
        };
        if better {
            best = Some((index, adapter.dedicated_video_memory));
        }
    }

    best.map(|(index, _)| index)
        .ok_or_else(|| GraphicsError::AdapterNotFound.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::WaveVizError;

    #[test]
    fn test_selects_max_memory() {
        let adapters = [
            AdapterDescriptor::new("integrated", 128 << 20),
            AdapterDescriptor::new("discrete", 8 << 30),
            AdapterDescriptor::new("warp", 0),
        ];
        assert_eq!(select_adapter(&adapters).unwrap(), 1);
    }

    #[test]
    fn test_tie_resolves_to_first() {
        let adapters = [
            AdapterDescriptor::new("a", 4 << 30),
            AdapterDescriptor::new("b", 4 << 30),
        ];
        assert_eq!(select_adapter(&adapters).unwrap(), 0);
    }

    #[test]
    fn test_all_zero_memory_still_selects_first() {
        // 软件适配器也许全部报告 0 字节专用显存；仍然必须选出一个，
        // 而不是让设备创建拿到空句柄
        let adapters = [
            AdapterDescriptor::new("warp_a", 0),
            AdapterDescriptor::new("warp_b", 0),
        ];
        assert_eq!(select_adapter(&adapters).unwrap(), 0);
    }

    #[test]
    fn test_empty_list_is_explicit_error() {
        let result = select_adapter(&[]);
        assert!(matches!(
            result,
            Err(WaveVizError::Graphics(GraphicsError::AdapterNotFound))
        ));
    }

    #[test]
    fn test_single_adapter() {
        let adapters = [AdapterDescriptor::new("only", 2 << 30)];
        assert_eq!(select_adapter(&adapters).unwrap(), 0);
    }
}
