//! 嵌套属性访问：按 `.` 分隔的路径读写模型与普通对象
//!
//! 每一段按当前节点的形态解析：模型走原生 `attribute` / `set_attribute`，
//! 普通值按对象键或数组下标访问。

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::data_core::{Attr, Model, ModelError, Options};
use crate::model::events::Event;
use crate::model::marshal::is_truthy;

/// 路径遍历中的节点
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Model(&'a Model),
    Value(&'a Value),
}

impl<'a> Node<'a> {
    fn child(self, segment: &str) -> Option<Node<'a>> {
        match self {
            Node::Model(model) => model.attribute(segment).map(Node::from),
            Node::Value(value) => child(value, segment).map(Node::Value),
        }
    }

    pub fn as_model(self) -> Option<&'a Model> {
        match self {
            Node::Model(m) => Some(m),
            Node::Value(_) => None,
        }
    }

    pub fn as_value(self) -> Option<&'a Value> {
        match self {
            Node::Value(v) => Some(v),
            Node::Model(_) => None,
        }
    }

    pub fn is_null(self) -> bool {
        matches!(self, Node::Value(Value::Null))
    }

    pub fn to_json(self, options: &Options) -> Value {
        match self {
            Node::Model(m) => m.to_json(options),
            Node::Value(v) => v.clone(),
        }
    }
}

impl<'a> From<&'a Attr> for Node<'a> {
    fn from(attr: &'a Attr) -> Self {
        match attr {
            Attr::Model(m) => Node::Model(m),
            Attr::Value(v) => Node::Value(v),
        }
    }
}

enum NodeMut<'a> {
    Model(&'a mut Model),
    Value(&'a mut Value),
}

impl<'a> NodeMut<'a> {
    /// 中间段：子节点必须存在且为真值
    fn descend(self, segment: &str) -> Option<NodeMut<'a>> {
        match self {
            NodeMut::Model(model) => match model.attribute_mut(segment)? {
                Attr::Model(m) => Some(NodeMut::Model(m)),
                Attr::Value(v) if is_truthy(v) => Some(NodeMut::Value(v)),
                Attr::Value(_) => None,
            },
            NodeMut::Value(value) => child_mut(value, segment)
                .filter(|v| is_truthy(v))
                .map(NodeMut::Value),
        }
    }

    /// 末段：模型走原生 set，普通对象直接写入
    fn write(self, segment: &str, value: Attr, options: &Options) -> Result<(), &'static str> {
        match self {
            NodeMut::Model(model) => {
                model.set_attribute(segment, value, options);
                Ok(())
            }
            NodeMut::Value(target) => {
                let Attr::Value(value) = value else {
                    return Err("cannot store a model inside a plain value");
                };
                match target {
                    Value::Object(map) => {
                        map.insert(segment.to_string(), value);
                        Ok(())
                    }
                    Value::Array(items) => {
                        let index = array_index(segment).ok_or("array index must be a decimal integer")?;
                        let slot = items.get_mut(index).ok_or("array index out of range")?;
                        *slot = value;
                        Ok(())
                    }
                    _ => Err("target is neither an object nor an array"),
                }
            }
        }
    }
}

/// 数组下标只接受规范十进制写法：无符号、无前导零（`0` 本身除外）
fn array_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical {
        segment.parse().ok()
    } else {
        None
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => array_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => {
            let index = array_index(segment)?;
            items.get_mut(index)
        }
        _ => None,
    }
}

fn assign(root: &mut Model, path: &str, value: Attr, options: &Options) -> Result<(), &'static str> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err("empty path");
    };
    let mut node = NodeMut::Model(root);
    for segment in parents {
        node = node
            .descend(segment)
            .ok_or("intermediate segment is missing or not traversable")?;
    }
    node.write(last, value, options)
}

impl Model {
    /// 按路径读取，例如 `model.get("author.address.city")`
    ///
    /// 任一段缺失或中间节点不可遍历时返回 None；末段的 `null` 视为存在。
    pub fn get(&self, path: &str) -> Option<Node<'_>> {
        let mut node = Node::Model(self);
        for segment in path.split('.') {
            match node.child(segment) {
                Some(next) => node = next,
                None => {
                    tracing::debug!("嵌套读取终止于 `{}`: {}", segment, path);
                    return None;
                }
            }
        }
        Some(node)
    }

    /// 读取并转为 JSON；子模型经 `to_json` 输出
    pub fn get_json(&self, path: &str) -> Option<Value> {
        self.get(path).map(|node| node.to_json(&Options::default()))
    }

    pub fn get_model(&self, path: &str) -> Option<&Model> {
        self.get(path).and_then(Node::as_model)
    }

    /// 读取并反序列化为 `T`；路径不存在时为 `Ok(None)`
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ModelError> {
        self.get_json(path)
            .map(serde_json::from_value)
            .transpose()
            .map_err(ModelError::from)
    }

    /// 路径存在且值不为 null
    pub fn has(&self, path: &str) -> bool {
        self.get(path).map_or(false, |node| !node.is_null())
    }

    pub fn set(&mut self, path: &str, value: impl Into<Attr>) -> Result<&mut Self, ModelError> {
        self.set_with(path, value, Options::default())
    }

    /// 按路径写入，只在末段写值
    ///
    /// 路径无法解析时不写入任何内容，触发一次 `lumbar:invalid:set`
    /// （选项中附带 `set_error`）并返回 `ModelError::InvalidSet`。
    /// 空路径直接交给原生 set，以 `""` 为键。
    pub fn set_with(
        &mut self,
        path: &str,
        value: impl Into<Attr>,
        options: Options,
    ) -> Result<&mut Self, ModelError> {
        let value = value.into();
        if path.is_empty() {
            return Ok(self.set_attribute(path, value, &options));
        }

        let reason = match assign(self, path, value, &options) {
            Ok(()) => return Ok(self),
            Err(reason) => reason,
        };

        let message = format!("Unable to do nested set for invalid key: {}", path);
        tracing::warn!("{} ({})", message, reason);
        let options = Options {
            set_error: Some(message.clone()),
            ..options
        };
        self.trigger(&Event::InvalidSet {
            message: &message,
            options: &options,
        });
        Err(ModelError::InvalidSet {
            path: path.to_string(),
            message,
        })
    }
}
