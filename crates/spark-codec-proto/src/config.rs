use serde::Deserialize;

/// 默认池化阈值：序列化尺寸达到 1 KiB 才使用缓冲池。
pub const DEFAULT_POOLING_THRESHOLD: usize = 1024;

/// `ProtoCodecConfig` 汇总 protobuf 编解码器的可调参数。
///
/// # 设计初衷（Why）
/// - 小消息走一次性分配更便宜，大消息走池化复用更划算，分界点取决于部署环境的消息分布，
///   因此需要可配置；
/// - 嵌入方通常把配置写在 TOML 等文件中，结构体直接实现 `Deserialize`。
///
/// # 契约说明（What）
/// - `pooling_threshold`：序列化尺寸 `>= pooling_threshold` 时使用池化缓冲，否则使用一次性缓冲；
///   取 `0` 表示始终池化；
/// - 反序列化时缺省字段取默认值，未知字段报错，避免拼写错误被静默忽略。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtoCodecConfig {
    pooling_threshold: usize,
}

impl ProtoCodecConfig {
    /// 以默认值创建配置。
    pub const fn new() -> Self {
        Self {
            pooling_threshold: DEFAULT_POOLING_THRESHOLD,
        }
    }

    /// 覆盖池化阈值。
    pub const fn with_pooling_threshold(mut self, threshold: usize) -> Self {
        self.pooling_threshold = threshold;
        self
    }

    /// 当前池化阈值。
    pub const fn pooling_threshold(&self) -> usize {
        self.pooling_threshold
    }

    /// 给定尺寸是否应走池化路径。
    pub const fn should_pool(&self, encoded_len: usize) -> bool {
        encoded_len >= self.pooling_threshold
    }
}

impl Default for ProtoCodecConfig {
    fn default() -> Self {
        Self::new()
    }
}
