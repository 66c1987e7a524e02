//! Lumbar：带嵌套属性访问的模型层
//!
//! 在属性存储之上提供按 `.` 路径的读写（`get` / `set`），
//! 以及依据 schema 的子模型解析与序列化（`parse` / `to_json`）。

pub mod model;
pub mod utils;

/// 当前版本，与 Cargo.toml 保持一致
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 重新导出主要类型
pub use model::data_core::{Attr, Attributes, Model, ModelError, Options};
pub use model::events::{Event, Events, Handler, ALL_EVENT, CHANGE_EVENT, INVALID_SET_EVENT};
pub use model::marshal::is_truthy;
pub use model::nested::Node;
pub use model::schema::Schema;
