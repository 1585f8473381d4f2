use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalyzerError, Result};

/// Default bound on the number of passes a fixpoint batch may take.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Configuration for the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Max number of passes for a fixpoint batch before analysis fails.
    pub max_iterations: usize,
    /// Run the validation batch, failing analysis if the plan isn't fully
    /// resolved.
    pub validate_resolved: bool,
    /// Log the plan after every rule that changes it.
    pub log_plan_changes: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            validate_resolved: true,
            log_plan_changes: false,
        }
    }
}

impl AnalyzerConfig {
    /// Decode a config from json. Missing fields take their default values.
    pub fn from_json(s: &str) -> Result<Self> {
        let conf: AnalyzerConfig = serde_json::from_str(s)?;
        MaxIterations::validate_value(conf.max_iterations)?;
        Ok(conf)
    }

    pub fn set_from_str(&mut self, name: &str, value: &str) -> Result<()> {
        let func = get_setting(name)?;
        (func.set)(value, self)
    }

    pub fn get_as_string(&self, name: &str) -> Result<String> {
        let func = get_setting(name)?;
        Ok((func.get)(self))
    }

    /// Reset a single setting to its default.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();
        let func = get_setting(name)?;

        let value = (func.get)(&def_conf);
        (func.set)(&value, self)
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Names of all settings, sorted.
    pub fn setting_names() -> Vec<&'static str> {
        let mut names: Vec<_> = GET_SET_FUNCTIONS.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn get_setting(name: &str) -> Result<&'static SettingFunctions> {
    GET_SET_FUNCTIONS
        .get(name.to_lowercase().as_str())
        .ok_or_else(|| AnalyzerError::UnknownSetting(name.to_string()))
}

struct SettingFunctions {
    set: fn(value: &str, conf: &mut AnalyzerConfig) -> Result<()>,
    get: fn(conf: &AnalyzerConfig) -> String,
}

impl SettingFunctions {
    const fn new<S: AnalyzerSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_str as _,
            get: S::get_as_string as _,
        }
    }
}

fn insert_setting<S: AnalyzerSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    let prev = map.insert(S::NAME, SettingFunctions::new::<S>());
    debug_assert!(prev.is_none(), "duplicate setting name: {}", S::NAME);
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<MaxIterations>(&mut map);
    insert_setting::<ValidateResolved>(&mut map);
    insert_setting::<LogPlanChanges>(&mut map);

    map
});

pub trait AnalyzerSetting: Sync + Send + 'static {
    const NAME: &'static str;

    fn set_from_str(value: &str, conf: &mut AnalyzerConfig) -> Result<()>;
    fn get_as_string(conf: &AnalyzerConfig) -> String;
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        other => Err(AnalyzerError::InvalidSetting {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

pub struct MaxIterations;

impl MaxIterations {
    pub fn validate_value(val: usize) -> Result<()> {
        if val == 0 {
            return Err(AnalyzerError::InvalidSetting {
                name: Self::NAME,
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl AnalyzerSetting for MaxIterations {
    const NAME: &'static str = "max_iterations";

    fn set_from_str(value: &str, conf: &mut AnalyzerConfig) -> Result<()> {
        let val: usize = value
            .trim()
            .parse()
            .map_err(|e| AnalyzerError::InvalidSetting {
                name: Self::NAME,
                reason: format!("{e}"),
            })?;
        Self::validate_value(val)?;

        conf.max_iterations = val;
        Ok(())
    }

    fn get_as_string(conf: &AnalyzerConfig) -> String {
        conf.max_iterations.to_string()
    }
}

pub struct ValidateResolved;

impl AnalyzerSetting for ValidateResolved {
    const NAME: &'static str = "validate_resolved";

    fn set_from_str(value: &str, conf: &mut AnalyzerConfig) -> Result<()> {
        conf.validate_resolved = parse_bool(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_string(conf: &AnalyzerConfig) -> String {
        conf.validate_resolved.to_string()
    }
}

pub struct LogPlanChanges;

impl AnalyzerSetting for LogPlanChanges {
    const NAME: &'static str = "log_plan_changes";

    fn set_from_str(value: &str, conf: &mut AnalyzerConfig) -> Result<()> {
        conf.log_plan_changes = parse_bool(Self::NAME, value)?;
        Ok(())
    }

    fn get_as_string(conf: &AnalyzerConfig) -> String {
        conf.log_plan_changes.to_string()
    }
}
