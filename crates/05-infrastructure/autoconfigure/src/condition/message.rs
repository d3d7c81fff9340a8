//! 条件评估消息与结果

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条目列表的展示风格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// 原样输出
    Normal,
    /// 使用单引号包裹
    Quote,
}

impl Style {
    fn apply(&self, item: &str) -> String {
        match self {
            Style::Normal => item.to_string(),
            Style::Quote => format!("'{}'", item),
        }
    }
}

/// 条件评估消息
///
/// 多个条件的消息以 `; ` 连接，例如
/// `@ConditionalOnClass found required class 'x.Lib'; @ConditionalOnProperty (feature.enabled) matched`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionMessage {
    message: String,
}

impl ConditionMessage {
    /// 空消息
    pub fn empty() -> Self {
        Self::default()
    }

    /// 直接由文本创建
    pub fn of(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// 为指定条件开始构建消息
    pub fn for_condition(condition: impl fmt::Display) -> ConditionMessageBuilder {
        Self::empty().and_condition(condition)
    }

    /// 为指定条件开始构建带细节说明的消息
    pub fn for_condition_with_details(
        condition: impl fmt::Display,
        details: impl fmt::Display,
    ) -> ConditionMessageBuilder {
        Self::empty().and_condition_with_details(condition, details)
    }

    /// 在现有消息之后追加一个条件
    pub fn and_condition(self, condition: impl fmt::Display) -> ConditionMessageBuilder {
        ConditionMessageBuilder {
            base: self,
            condition: condition.to_string(),
        }
    }

    /// 在现有消息之后追加一个带细节说明的条件
    pub fn and_condition_with_details(
        self,
        condition: impl fmt::Display,
        details: impl fmt::Display,
    ) -> ConditionMessageBuilder {
        let condition = condition.to_string();
        let details = details.to_string();
        let condition = match (condition.is_empty(), details.is_empty()) {
            (_, true) => condition,
            (true, false) => details,
            (false, false) => format!("{} {}", condition, details),
        };
        ConditionMessageBuilder {
            base: self,
            condition,
        }
    }

    /// 追加文本（以空格分隔）
    pub fn append(self, text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        if text.is_empty() {
            return self;
        }
        if self.message.is_empty() {
            return Self::of(text);
        }
        Self::of(format!("{} {}", self.message, text))
    }

    /// 消息是否为空
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    /// 消息文本
    pub fn as_str(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConditionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 条件消息构建器
#[derive(Debug, Clone)]
pub struct ConditionMessageBuilder {
    base: ConditionMessage,
    condition: String,
}

impl ConditionMessageBuilder {
    /// 以固定结论结束，例如 `found 'session' scope`
    pub fn found_exactly(self, result: impl fmt::Display) -> ConditionMessage {
        self.finish(format!("found {}", result))
    }

    /// 以原因结束
    pub fn because(self, reason: impl fmt::Display) -> ConditionMessage {
        let reason = reason.to_string();
        self.finish(reason)
    }

    /// 以"不可用"结束
    pub fn not_available(self, item: impl fmt::Display) -> ConditionMessage {
        self.finish(format!("{} is not available", item))
    }

    /// 以"找到"开始列举条目
    pub fn found(self, article: impl Into<String>, plural: impl Into<String>) -> ItemsBuilder {
        self.items_builder("found", article.into(), plural.into())
    }

    /// 以"找到"开始列举条目（单复数同形）
    pub fn found_one(self, article: impl Into<String>) -> ItemsBuilder {
        let article = article.into();
        self.items_builder("found", article.clone(), article)
    }

    /// 以"未找到"开始列举条目
    pub fn did_not_find(self, article: impl Into<String>, plural: impl Into<String>) -> ItemsBuilder {
        self.items_builder("did not find", article.into(), plural.into())
    }

    /// 以"未找到"开始列举条目（单复数同形）
    pub fn did_not_find_one(self, article: impl Into<String>) -> ItemsBuilder {
        let article = article.into();
        self.items_builder("did not find", article.clone(), article)
    }

    fn items_builder(self, reason: &str, singular: String, plural: String) -> ItemsBuilder {
        ItemsBuilder {
            builder: self,
            reason: reason.to_string(),
            singular,
            plural,
        }
    }

    fn finish(self, outcome: String) -> ConditionMessage {
        let part = match (self.condition.is_empty(), outcome.is_empty()) {
            (true, _) => outcome,
            (false, true) => self.condition,
            (false, false) => format!("{} {}", self.condition, outcome),
        };
        if self.base.is_empty() {
            ConditionMessage::of(part)
        } else if part.is_empty() {
            self.base
        } else {
            ConditionMessage::of(format!("{}; {}", self.base.message, part))
        }
    }
}

/// 条目列举构建器
#[derive(Debug, Clone)]
pub struct ItemsBuilder {
    builder: ConditionMessageBuilder,
    reason: String,
    singular: String,
    plural: String,
}

impl ItemsBuilder {
    /// 不列举具体条目，例如 `did not find any beans`
    pub fn at_all(self) -> ConditionMessage {
        let text = format!("{} {}", self.reason, self.plural);
        self.builder.finish(text)
    }

    /// 列举条目
    pub fn items<I, S>(self, style: Style, items: I) -> ConditionMessage
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items.into_iter().map(|item| style.apply(item.as_ref())).collect();
        let noun = if items.len() == 1 { &self.singular } else { &self.plural };
        let mut text = format!("{} {}", self.reason, noun);
        if !items.is_empty() {
            text.push(' ');
            text.push_str(&items.join(", "));
        }
        self.builder.finish(text)
    }
}

/// 条件评估结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    /// 是否匹配
    pub is_match: bool,
    /// 评估消息
    pub message: ConditionMessage,
}

impl ConditionOutcome {
    /// 创建结果
    pub fn new(is_match: bool, message: ConditionMessage) -> Self {
        Self { is_match, message }
    }

    /// 匹配结果
    pub fn matched(message: ConditionMessage) -> Self {
        Self::new(true, message)
    }

    /// 不匹配结果
    pub fn no_match(message: ConditionMessage) -> Self {
        Self::new(false, message)
    }

    /// 取反
    pub fn inverse(self) -> Self {
        Self::new(!self.is_match, self.message)
    }
}

impl fmt::Display for ConditionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
