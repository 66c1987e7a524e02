//! 事件：每个模型实例持有的观察者列表

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::model::data_core::{Attr, Model, Options};

// === 事件名常量 ===
pub const INVALID_SET_EVENT: &str = "lumbar:invalid:set";
pub const CHANGE_EVENT: &str = "change";
pub const ALL_EVENT: &str = "all";

/// 事件负载，借用触发时的模型状态
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// 单个属性被修改或移除（`value` 为 None 表示移除）
    AttributeChanged {
        attribute: &'a str,
        value: Option<&'a Attr>,
        options: &'a Options,
    },
    /// 一次 set 调用结束且至少有一个属性变化
    Changed { options: &'a Options },
    /// 嵌套 set 无法解析路径
    InvalidSet {
        message: &'a str,
        options: &'a Options,
    },
}

impl Event<'_> {
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Event::AttributeChanged { attribute, .. } => {
                Cow::Owned(format!("{}:{}", CHANGE_EVENT, attribute))
            }
            Event::Changed { .. } => Cow::Borrowed(CHANGE_EVENT),
            Event::InvalidSet { .. } => Cow::Borrowed(INVALID_SET_EVENT),
        }
    }

    pub fn options(&self) -> &Options {
        match self {
            Event::AttributeChanged { options, .. }
            | Event::Changed { options }
            | Event::InvalidSet { options, .. } => options,
        }
    }
}

pub type Handler = Arc<dyn Fn(&Model, &Event<'_>) + Send + Sync>;

/// 按事件名注册的回调；绑定到 `all` 的回调接收全部事件
#[derive(Clone, Default)]
pub struct Events {
    handlers: Vec<(String, Handler)>,
}

impl Events {
    pub fn on(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.push((name.into(), handler));
    }

    /// 移除该事件名下的全部回调，返回移除数量
    pub fn off(&mut self, name: &str) -> usize {
        let before = self.handlers.len();
        self.handlers.retain(|(n, _)| n != name);
        before - self.handlers.len()
    }

    /// 先返回绑定到 `name` 的回调，再返回 `all` 回调，各自按注册顺序
    pub fn listeners<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Handler> + 'a {
        let named = self.handlers.iter().filter(move |(n, _)| n == name);
        let all = self
            .handlers
            .iter()
            .filter(move |(n, _)| n == ALL_EVENT && name != ALL_EVENT);
        named.chain(all).map(|(_, h)| h)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|(n, _)| n))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler {
        let counter = counter.clone();
        Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_listeners_match_name_and_all() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut events = Events::default();
        events.on(CHANGE_EVENT, counting_handler(&hits));
        events.on(ALL_EVENT, counting_handler(&hits));
        events.on(INVALID_SET_EVENT, counting_handler(&hits));

        assert_eq!(events.listeners(CHANGE_EVENT).count(), 2, "change 与 all 都应匹配");
        assert_eq!(events.listeners("change:title").count(), 1, "只有 all 匹配");
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_named_listeners_run_before_all() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut events = Events::default();
        for name in [ALL_EVENT, CHANGE_EVENT, ALL_EVENT, CHANGE_EVENT] {
            let sink = order.clone();
            let label = format!("{}#{}", name, events.len());
            events.on(name, Arc::new(move |_, _| sink.lock().unwrap().push(label.clone())));
        }

        let model = Model::new(crate::model::schema::Schema::new("Plain").build());
        let options = Options::default();
        let event = Event::Changed { options: &options };
        for handler in events.listeners(CHANGE_EVENT) {
            handler(&model, &event);
        }

        assert_eq!(
            *order.lock().unwrap(),
            vec!["change#1", "change#3", "all#0", "all#2"],
            "具名回调先于 all 回调"
        );
    }

    #[test]
    fn test_off_removes_only_named_handlers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut events = Events::default();
        events.on(CHANGE_EVENT, counting_handler(&hits));
        events.on(CHANGE_EVENT, counting_handler(&hits));
        events.on(INVALID_SET_EVENT, counting_handler(&hits));

        assert_eq!(events.off(CHANGE_EVENT), 2);
        assert_eq!(events.off(CHANGE_EVENT), 0, "重复移除应无效果");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_event_names() {
        let options = Options::default();
        let changed = Event::AttributeChanged {
            attribute: "title",
            value: None,
            options: &options,
        };
        assert_eq!(changed.name(), "change:title");
        assert_eq!(Event::Changed { options: &options }.name(), CHANGE_EVENT);
        let invalid = Event::InvalidSet {
            message: "bad",
            options: &options,
        };
        assert_eq!(invalid.name(), INVALID_SET_EVENT);
    }
}
