//! 日志初始化

use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

/// 安装全局 fmt 订阅者；已安装时返回 false
pub fn init_tracing(level: Level) -> bool {
    SubscriberBuilder::default()
        .with_max_level(level)
        .try_init()
        .is_ok()
}

/// 测试用：输出交给 libtest 捕获，只在失败时显示
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = SubscriberBuilder::default()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
