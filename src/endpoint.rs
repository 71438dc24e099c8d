//! The four actuator endpoint kinds polled per source.

use serde::{Deserialize, Serialize};

/// Endpoint kinds, one state slot each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// Bean graph of every application context
    Beans,
    /// Health status and component health
    Health,
    /// `@ConfigurationProperties` beans
    ConfigProps,
    /// Micrometer metrics (names, then one detail request per name)
    Metrics,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 4] = [
        EndpointKind::Beans,
        EndpointKind::Health,
        EndpointKind::ConfigProps,
        EndpointKind::Metrics,
    ];

    /// Human-readable endpoint title, used in error messages.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Beans => "Beans",
            Self::Health => "Health",
            Self::ConfigProps => "Configuration Properties",
            Self::Metrics => "Metrics",
        }
    }

    /// Path segment below the actuator base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Beans => "beans",
            Self::Health => "health",
            Self::ConfigProps => "configprops",
            Self::Metrics => "metrics",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beans => write!(f, "beans"),
            Self::Health => write!(f, "health"),
            Self::ConfigProps => write!(f, "config-props"),
            Self::Metrics => write!(f, "metrics"),
        }
    }
}
