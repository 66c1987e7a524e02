//! Model：属性存储、原生读写、构造与持久化

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use jsonpath_rust::JsonPath;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::events::{Event, Events, Handler};
use crate::model::schema::Schema;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("属性必须是对象，实际为 {0}")]
    NotAnObject(String),
    #[error("{message}")]
    InvalidSet { path: String, message: String },
}

/// 属性名到属性值的映射
pub type Attributes = BTreeMap<String, Attr>;

/// 属性值：普通 JSON 值（标量、对象、数组）或子模型
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Value(Value),
    Model(Model),
}

impl Attr {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attr::Value(v) => Some(v),
            Attr::Model(_) => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Attr::Model(m) => Some(m),
            Attr::Value(_) => None,
        }
    }

    pub fn to_json(&self, options: &Options) -> Value {
        match self {
            Attr::Value(v) => v.clone(),
            Attr::Model(m) => m.to_json(options),
        }
    }
}

impl From<Value> for Attr {
    fn from(value: Value) -> Self {
        Attr::Value(value)
    }
}

impl From<Model> for Attr {
    fn from(model: Model) -> Self {
        Attr::Model(model)
    }
}

/// 读写选项，原样透传给原生 set / to_json 与事件负载
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// 构造时先经过 `parse`
    pub parse: bool,
    /// 不触发 change 事件
    pub silent: bool,
    /// 移除而非写入
    pub unset: bool,
    /// 嵌套 set 失败时填入的错误信息
    pub set_error: Option<String>,
    /// 调用方自定义数据
    pub extra: Map<String, Value>,
}

impl Options {
    pub fn parsing() -> Self {
        Self {
            parse: true,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }
}

pub struct Model {
    pub(crate) schema: Arc<Schema>,
    attributes: Attributes,
    events: Events,
}

impl Model {
    /// 空模型，仅含 schema 默认值
    pub fn new(schema: Arc<Schema>) -> Self {
        let attributes = schema
            .defaults()
            .iter()
            .map(|(k, v)| (k.clone(), Attr::Value(v.clone())))
            .collect();
        Self {
            schema,
            attributes,
            events: Events::default(),
        }
    }

    /// 从原始 JSON 构造；`options.parse` 为真时先经过 `parse` 物化子模型
    pub fn from_json(schema: Arc<Schema>, raw: &Value, options: Options) -> Result<Self, ModelError> {
        let mut model = Self {
            schema,
            attributes: Attributes::new(),
            events: Events::default(),
        };
        let mut attrs = if options.parse {
            model.parse(raw)?
        } else {
            plain_attributes(raw)?
        };
        for (key, value) in model.schema.defaults() {
            attrs
                .entry(key.clone())
                .or_insert_with(|| Attr::Value(value.clone()));
        }
        model.set_many(attrs, &options);
        Ok(model)
    }

    /// 读取 JSON 文件并按 schema 解析
    pub fn load_file(schema: Arc<Schema>, p: &Path) -> Result<Self, ModelError> {
        let raw: Value = serde_json::from_reader(BufReader::new(File::open(p)?))?;
        let model = Self::from_json(schema, &raw, Options::parsing())?;
        tracing::info!("已加载模型 {}: {}", model.schema.name(), p.display());
        Ok(model)
    }

    /// 将 `to_json` 结果格式化写入文件
    pub fn save_file(&self, p: &Path, options: &Options) -> Result<(), ModelError> {
        serde_json::to_writer_pretty(File::create(p)?, &self.to_json(options))?;
        tracing::info!("模型 {} 已保存到: {}", self.schema.name(), p.display());
        Ok(())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    // === 原生存储：单层键，不解析 `.` ===

    pub fn attribute(&self, key: &str) -> Option<&Attr> {
        self.attributes.get(key)
    }

    pub(crate) fn attribute_mut(&mut self, key: &str) -> Option<&mut Attr> {
        self.attributes.get_mut(key)
    }

    pub fn set_attribute(&mut self, key: &str, value: Attr, options: &Options) -> &mut Self {
        self.apply(vec![(key.to_string(), value)], options)
    }

    /// 批量写入；键按字面存储，即使包含 `.`
    pub fn set_many<I, K, V>(&mut self, attrs: I, options: &Options) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Attr>,
    {
        let changes = attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.apply(changes, options)
    }

    pub fn unset(&mut self, key: &str, options: &Options) -> &mut Self {
        let options = Options {
            unset: true,
            ..options.clone()
        };
        self.apply(vec![(key.to_string(), Attr::Value(Value::Null))], &options)
    }

    /// 原生序列化：子模型使用其自身的 `to_json`
    pub fn to_json_native(&self, options: &Options) -> Map<String, Value> {
        self.attributes
            .iter()
            .map(|(k, a)| (k.clone(), a.to_json(options)))
            .collect()
    }

    fn apply(&mut self, changes: Vec<(String, Attr)>, options: &Options) -> &mut Self {
        let mut changed = Vec::new();
        for (key, value) in changes {
            if options.unset {
                if self.attributes.remove(&key).is_some() {
                    changed.push(key);
                }
            } else if self.attributes.get(&key) != Some(&value) {
                self.attributes.insert(key.clone(), value);
                changed.push(key);
            }
        }

        if options.silent || changed.is_empty() {
            return self;
        }
        for key in &changed {
            self.trigger(&Event::AttributeChanged {
                attribute: key,
                value: self.attributes.get(key),
                options,
            });
        }
        self.trigger(&Event::Changed { options });
        self
    }

    // === 事件 ===

    pub fn on<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&Model, &Event<'_>) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.events.on(name, handler);
        self
    }

    pub fn off(&mut self, name: &str) -> usize {
        self.events.off(name)
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn trigger(&self, event: &Event<'_>) {
        let name = event.name();
        for handler in self.events.listeners(&name) {
            handler(self, event);
        }
    }

    /// 对 `to_json` 结果执行 JSONPath 查询，返回匹配节点的副本
    pub fn query(&self, json_path: &str) -> Result<Vec<Value>, ModelError> {
        let json = self.to_json(&Options::default());
        let hits: Vec<&Value> = json
            .query(json_path)
            .map_err(|e| ModelError::JsonPath(e.to_string()))?;
        Ok(hits.into_iter().cloned().collect())
    }
}

/// `null` 视为空属性集，其他非对象值报错
pub(crate) fn plain_attributes(raw: &Value) -> Result<Attributes, ModelError> {
    match raw {
        Value::Null => Ok(Attributes::new()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), Attr::Value(v.clone())))
            .collect()),
        other => Err(ModelError::NotAnObject(kind_name(other).to_string())),
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// 克隆不复制监听器
impl Clone for Model {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            attributes: self.attributes.clone(),
            events: Events::default(),
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.attributes == other.attributes
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("schema", &self.schema.name())
            .field("attributes", &self.attributes)
            .field("events", &self.events)
            .finish()
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json(&Options::default()).serialize(serializer)
    }
}
