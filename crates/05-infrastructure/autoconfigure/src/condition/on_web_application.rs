//! Web 应用类型条件

use super::message::{ConditionMessage, ConditionOutcome};
use super::{presence, unresolved, FilteringCondition, Presence};
use crate::context::AutoConfigurationContext;
use config_abstractions::ApplicationKind;
use infrastructure_common::{AnnotationKind, AutoConfigError, AutoConfigResult, ClassMetadata};

/// Servlet Web 应用的标志类
pub const SERVLET_WEB_APPLICATION_CLASS: &str = "lorn_web::servlet::GenericWebApplicationContext";

/// 响应式 Web 应用的标志类
pub const REACTIVE_WEB_APPLICATION_CLASS: &str = "lorn_web::reactive::HandlerResult";

/// Servlet 应用特有的作用域
const SESSION_SCOPE: &str = "session";

/// Web 应用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebApplicationType {
    /// 任意 Web 应用
    #[default]
    Any,
    /// Servlet Web 应用
    Servlet,
    /// 响应式 Web 应用
    Reactive,
}

impl WebApplicationType {
    /// 解析类型名称（忽略大小写，空串视为 `Any`）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "" | "ANY" => Some(Self::Any),
            "SERVLET" => Some(Self::Servlet),
            "REACTIVE" => Some(Self::Reactive),
            _ => None,
        }
    }
}

/// Web 环境条件声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConditionSpec {
    /// `true` 表示要求是 Web 应用，`false` 表示要求不是
    pub required: bool,
    /// 应用类型
    pub web_type: WebApplicationType,
}

impl WebConditionSpec {
    /// 从索引值构建
    pub fn from_index_value(class_name: &str, value: &str) -> AutoConfigResult<Self> {
        let web_type = WebApplicationType::parse(value).ok_or_else(|| {
            AutoConfigError::invalid_attribute(
                class_name,
                "ConditionalOnWebApplication",
                format!("未知的 Web 应用类型 '{}'", value),
            )
        })?;
        Ok(Self {
            required: true,
            web_type,
        })
    }

    /// 从类元数据构建
    pub fn from_class_metadata(metadata: &ClassMetadata) -> AutoConfigResult<Option<Self>> {
        if let Some(attributes) = metadata.annotation(AnnotationKind::ConditionalOnWebApplication) {
            let value = attributes.get_string("type").unwrap_or_default();
            return Self::from_index_value(&metadata.class_name, value).map(Some);
        }
        if metadata.is_annotated(AnnotationKind::ConditionalOnNotWebApplication) {
            return Ok(Some(Self {
                required: false,
                web_type: WebApplicationType::Any,
            }));
        }
        Ok(None)
    }

    /// 判断应用类型需要检查的标志类
    fn marker_classes(&self) -> &'static [&'static str] {
        match self.web_type {
            WebApplicationType::Servlet => &[SERVLET_WEB_APPLICATION_CLASS],
            WebApplicationType::Reactive => &[REACTIVE_WEB_APPLICATION_CLASS],
            WebApplicationType::Any => &[SERVLET_WEB_APPLICATION_CLASS, REACTIVE_WEB_APPLICATION_CLASS],
        }
    }

    fn annotation(&self) -> AnnotationKind {
        if self.required {
            AnnotationKind::ConditionalOnWebApplication
        } else {
            AnnotationKind::ConditionalOnNotWebApplication
        }
    }
}

/// Web 应用类型条件
#[derive(Debug, Clone, Copy, Default)]
pub struct OnWebApplicationCondition;

impl OnWebApplicationCondition {
    /// 条件名称
    pub const NAME: &'static str = "OnWebApplicationCondition";

    /// 评估条件
    pub fn evaluate(spec: &WebConditionSpec, context: &AutoConfigurationContext) -> ConditionOutcome {
        let outcome = match spec.web_type {
            WebApplicationType::Servlet => is_servlet_web_application(context),
            WebApplicationType::Reactive => is_reactive_web_application(context),
            WebApplicationType::Any => is_any_web_application(context, spec.required),
        };

        let message = ConditionMessage::for_condition(spec.annotation()).because(outcome.message);
        if spec.required == outcome.is_match {
            ConditionOutcome::matched(message)
        } else {
            ConditionOutcome::no_match(message)
        }
    }
}

impl FilteringCondition for OnWebApplicationCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_outcomes(
        &self,
        candidates: &[Option<&str>],
        context: &AutoConfigurationContext,
    ) -> AutoConfigResult<Vec<Option<ConditionOutcome>>> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let Some(class_name) = candidate else {
                outcomes.push(None);
                continue;
            };
            let spec = context
                .metadata()
                .entry(class_name)?
                .and_then(|entry| entry.web_condition.clone());
            let outcome = match spec {
                Some(spec) if markers_resolvable(class_name, &spec, context) => Some(Self::evaluate(&spec, context)),
                _ => None,
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// 标志类无法链接时不给出结论
fn markers_resolvable(class_name: &str, spec: &WebConditionSpec, context: &AutoConfigurationContext) -> bool {
    for marker in spec.marker_classes() {
        if let Presence::Unresolved(message) = presence(marker, context) {
            unresolved(class_name, marker, &message, context);
            return false;
        }
    }
    true
}

fn is_any_web_application(context: &AutoConfigurationContext, required: bool) -> ConditionOutcome {
    let servlet = is_servlet_web_application(context);
    if servlet.is_match && required {
        return servlet;
    }
    let reactive = is_reactive_web_application(context);
    if reactive.is_match && required {
        return reactive;
    }
    ConditionOutcome::new(
        servlet.is_match || reactive.is_match,
        servlet.message.append("and").append(reactive.message.as_str()),
    )
}

fn is_servlet_web_application(context: &AutoConfigurationContext) -> ConditionOutcome {
    if !context.class_resolver().is_present(SERVLET_WEB_APPLICATION_CLASS) {
        return ConditionOutcome::no_match(
            ConditionMessage::for_condition("")
                .did_not_find_one("servlet web application classes")
                .at_all(),
        );
    }
    if context
        .registry()
        .registered_scope_names()
        .iter()
        .any(|scope| scope == SESSION_SCOPE)
    {
        return ConditionOutcome::matched(ConditionMessage::for_condition("").found_exactly("'session' scope"));
    }
    if context.environment().application_kind() == ApplicationKind::Servlet {
        return ConditionOutcome::matched(ConditionMessage::for_condition("").found_exactly("servlet application kind"));
    }
    ConditionOutcome::no_match(ConditionMessage::for_condition("").because("not a servlet web application"))
}

fn is_reactive_web_application(context: &AutoConfigurationContext) -> ConditionOutcome {
    if !context.class_resolver().is_present(REACTIVE_WEB_APPLICATION_CLASS) {
        return ConditionOutcome::no_match(
            ConditionMessage::for_condition("")
                .did_not_find_one("reactive web application classes")
                .at_all(),
        );
    }
    if context.environment().application_kind() == ApplicationKind::Reactive {
        return ConditionOutcome::matched(ConditionMessage::for_condition("").found_exactly("reactive application kind"));
    }
    ConditionOutcome::no_match(ConditionMessage::for_condition("").because("not a reactive web application"))
}
