//! 嵌套模型的解析与序列化，依据 schema 中的 modelAttributes

use serde_json::Value;

use crate::model::data_core::{plain_attributes, Attr, Attributes, Model, ModelError, Options};
use crate::model::nested::Node;

/// JSON 真值判定：null、false、0、NaN、空串为假，对象与数组恒为真
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Model {
    /// 浅拷贝原始属性，将 modelAttributes 中声明且为真值的属性构造为子模型
    ///
    /// 子模型以 `parse` 选项构造，由其自身的 schema 继续向下解析。
    /// 不修改 `raw`。
    pub fn parse(&self, raw: &Value) -> Result<Attributes, ModelError> {
        let mut parsed = plain_attributes(raw)?;
        for (attr, variant) in self.schema.model_attributes() {
            let Some(Attr::Value(sub)) = parsed.get(attr) else {
                continue;
            };
            if !is_truthy(sub) {
                continue;
            }
            let model = Model::from_json(variant.clone(), sub, Options::parsing())?;
            tracing::debug!("{}.{} 解析为 {}", self.schema.name(), attr, variant.name());
            parsed.insert(attr.to_string(), Attr::Model(model));
        }
        Ok(parsed)
    }

    /// 原生序列化后，用子模型自身的 `to_json` 覆盖 modelAttributes 中的属性
    pub fn to_json(&self, options: &Options) -> Value {
        let mut json = self.to_json_native(options);
        for (attr, _) in self.schema.model_attributes() {
            match self.get(attr) {
                Some(Node::Model(model)) => {
                    json.insert(attr.to_string(), model.to_json(options));
                }
                Some(Node::Value(value)) if is_truthy(value) => {
                    tracing::debug!("{}.{} 不是子模型，保留原生序列化结果", self.schema.name(), attr);
                }
                _ => {}
            }
        }
        Value::Object(json)
    }
}
