//! Schema：模型的类级配置（modelAttributes 与默认值）

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

/// 模型变体描述：名称、需要物化为子模型的属性表、默认属性值
///
/// 通过构建器一次性声明，之后以 `Arc<Schema>` 共享：
///
/// ```
/// use lumbar::Schema;
///
/// let author = Schema::new("Author").build();
/// let book = Schema::new("Book")
///     .model_attribute("author", author)
///     .default_value("title", serde_json::json!("untitled"))
///     .build();
/// assert!(book.variant_for("author").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    model_attributes: BTreeMap<String, Arc<Schema>>,
    defaults: Map<String, Value>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 声明属性 `attr` 在 parse / to_json 时按 `variant` 物化为子模型
    pub fn model_attribute(mut self, attr: impl Into<String>, variant: Arc<Schema>) -> Self {
        self.model_attributes.insert(attr.into(), variant);
        self
    }

    /// 构造时缺失的属性使用该默认值
    pub fn default_value(mut self, attr: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(attr.into(), value);
        self
    }

    pub fn build(self) -> Arc<Schema> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按属性名升序遍历 modelAttributes
    pub fn model_attributes(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.model_attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn variant_for(&self, attr: &str) -> Option<&Arc<Schema>> {
        self.model_attributes.get(attr)
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_collects_configuration() {
        let author = Schema::new("Author").build();
        let publisher = Schema::new("Publisher").build();
        let book = Schema::new("Book")
            .model_attribute("publisher", publisher)
            .model_attribute("author", author)
            .default_value("pages", json!(0))
            .build();

        assert_eq!(book.name(), "Book");
        let names: Vec<&str> = book.model_attributes().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["author", "publisher"], "modelAttributes 应按名称排序");
        assert_eq!(book.variant_for("author").map(|s| s.name()), Some("Author"));
        assert!(book.variant_for("title").is_none(), "未声明的属性不应有变体");
        assert_eq!(book.defaults().get("pages"), Some(&json!(0)));
    }

    #[test]
    fn test_redeclared_attribute_replaces_variant() {
        let first = Schema::new("First").build();
        let second = Schema::new("Second").build();
        let schema = Schema::new("Holder")
            .model_attribute("child", first)
            .model_attribute("child", second);

        assert_eq!(schema.variant_for("child").map(|s| s.name()), Some("Second"));
    }
}
