//! Decoded actuator payloads.
//!
//! Only the fields the engine and its consumers read are typed; nested
//! detail that varies per application stays as `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// Beans
// =============================================================================

/// `GET <base>/beans`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeansReport {
    #[serde(default)]
    pub contexts: BTreeMap<String, BeansContext>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeansContext {
    #[serde(default)]
    pub beans: BTreeMap<String, BeanDescriptor>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeanDescriptor {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, rename = "type")]
    pub bean_type: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// One application context together with its name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedContext<C> {
    pub name: String,
    pub context: C,
}

impl BeansReport {
    pub fn named_contexts(&self) -> Vec<NamedContext<BeansContext>> {
        self.contexts
            .iter()
            .map(|(name, context)| NamedContext {
                name: name.clone(),
                context: context.clone(),
            })
            .collect()
    }

    pub fn bean_count(&self) -> usize {
        self.contexts.values().map(|c| c.beans.len()).sum()
    }
}

// =============================================================================
// Health
// =============================================================================

pub const STATUS_UP: &str = "UP";
pub const STATUS_DOWN: &str = "DOWN";

/// `GET <base>/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub components: BTreeMap<String, HealthComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthComponent {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, HealthComponent>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == STATUS_UP
    }

    /// Component name to status, nested detail dropped.
    pub fn component_statuses(&self) -> BTreeMap<String, String> {
        self.components
            .iter()
            .map(|(name, component)| (name.clone(), component.status.clone()))
            .collect()
    }
}

// =============================================================================
// Configuration properties
// =============================================================================

/// `GET <base>/configprops`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigPropsReport {
    #[serde(default)]
    pub contexts: BTreeMap<String, ConfigPropsContext>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPropsContext {
    #[serde(default)]
    pub beans: BTreeMap<String, ConfigPropsBean>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPropsBean {
    pub prefix: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
}

impl ConfigPropsReport {
    pub fn named_contexts(&self) -> Vec<NamedContext<ConfigPropsContext>> {
        self.contexts
            .iter()
            .map(|(name, context)| NamedContext {
                name: name.clone(),
                context: context.clone(),
            })
            .collect()
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// `GET <base>/metrics`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricNames {
    #[serde(default)]
    pub names: Vec<String>,
}

/// `GET <base>/metrics/<name>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDetail {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_unit: Option<String>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub available_tags: Vec<MetricTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub statistic: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTag {
    pub tag: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl MetricDetail {
    /// Value of one statistic (`COUNT`, `VALUE`, `TOTAL_TIME`, ...).
    pub fn statistic(&self, statistic: &str) -> Option<f64> {
        self.measurements
            .iter()
            .find(|m| m.statistic == statistic)
            .map(|m| m.value)
    }
}

/// Combined result of the two-phase metrics fetch for one source
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub metrics: Vec<MetricDetail>,
}
