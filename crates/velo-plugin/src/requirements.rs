//! Declarative startup preconditions.
//!
//! A plugin builds a [`RequirementChecker`], adds required and optional
//! checks, and runs them against the [`StartupContext`]. Every required
//! failure is collected (not short-circuited) so the operator sees the full
//! list at once; optional failures only produce warnings.

use std::sync::Arc;

use tracing::warn;

use velo_config::Mode;

use crate::context::StartupContext;
use crate::error::{PluginError, PluginResult};

/// A single precondition check.
pub type CheckFn = Arc<dyn Fn(&StartupContext) -> Result<(), String> + Send + Sync>;

/// A named precondition.
#[derive(Clone)]
pub struct Requirement {
    /// Short label used in failure messages.
    pub name: String,
    /// The check itself.
    pub check: CheckFn,
    /// Required checks fail startup; optional ones only warn.
    pub required: bool,
}

/// Collects preconditions for one plugin and evaluates them together.
pub struct RequirementChecker {
    plugin_name: String,
    requirements: Vec<Requirement>,
}

impl RequirementChecker {
    /// Create a checker for the named plugin.
    #[must_use]
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            requirements: Vec::new(),
        }
    }

    /// Add a required check.
    #[must_use]
    pub fn add_required(mut self, name: impl Into<String>, check: CheckFn) -> Self {
        self.requirements.push(Requirement {
            name: name.into(),
            check,
            required: true,
        });
        self
    }

    /// Add an optional check. Failure is logged, never fatal.
    #[must_use]
    pub fn add_optional(mut self, name: impl Into<String>, check: CheckFn) -> Self {
        self.requirements.push(Requirement {
            name: name.into(),
            check,
            required: false,
        });
        self
    }

    /// Run every check.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::RequirementsFailed`] listing every required
    /// check that failed, joined by `"; "`.
    pub fn check(&self, ctx: &StartupContext) -> PluginResult<()> {
        let mut failures = Vec::new();
        for req in &self.requirements {
            if let Err(reason) = (req.check)(ctx) {
                if req.required {
                    failures.push(format!("{}: {reason}", req.name));
                } else {
                    warn!(
                        plugin = %self.plugin_name,
                        requirement = %req.name,
                        %reason,
                        "optional requirement not met"
                    );
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PluginError::RequirementsFailed {
                details: failures.join("; "),
            })
        }
    }
}

/// Check that the daemon runs in the given mode.
#[must_use]
pub fn require_mode(mode: Mode) -> CheckFn {
    Arc::new(move |ctx| {
        if ctx.mode == mode {
            Ok(())
        } else {
            Err(format!("requires {mode} mode, running in {}", ctx.mode))
        }
    })
}

/// Check that a plugin setting is present and non-empty.
#[must_use]
pub fn require_setting(plugin: impl Into<String>, key: impl Into<String>) -> CheckFn {
    let plugin = plugin.into();
    let key = key.into();
    Arc::new(move |ctx| {
        match ctx.config.plugin_setting_str(&plugin, &key) {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(format!("setting {plugin}.{key} is not set")),
        }
    })
}

/// Passes if at least one inner check passes. Fails with every inner
/// failure listed when none do.
#[must_use]
pub fn require_any(checks: Vec<CheckFn>) -> CheckFn {
    Arc::new(move |ctx| {
        let mut reasons = Vec::new();
        for check in &checks {
            match check(ctx) {
                Ok(()) => return Ok(()),
                Err(reason) => reasons.push(reason),
            }
        }
        Err(format!("none satisfied: {}", reasons.join(", ")))
    })
}

/// Passes only if every inner check passes; stops at the first failure.
#[must_use]
pub fn require_all(checks: Vec<CheckFn>) -> CheckFn {
    Arc::new(move |ctx| {
        for check in &checks {
            check(ctx)?;
        }
        Ok(())
    })
}
