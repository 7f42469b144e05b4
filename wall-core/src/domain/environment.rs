//! Deployment environments and the resource names derived from them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Deployment target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer machine, served by `wall-api` directly
    Local,
    Test,
    Prod,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment '{0}' (expected local, test or prod)")]
pub struct UnknownEnvironment(pub String);

impl Environment {
    /// Display name used inside resource and stage names
    pub fn name(self) -> &'static str {
        match self {
            Environment::Local => "Local",
            Environment::Test => "Test",
            Environment::Prod => "Prod",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    /// Whether the delivery pipeline can deploy to this environment
    pub fn is_deployable(self) -> bool {
        !matches!(self, Environment::Local)
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" => Ok(Environment::Local),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names of everything provisioned for one environment
///
/// All names embed the environment, so two environments never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNames {
    pub environment: Environment,
    pub stack_name: String,
    pub table_name: String,
    pub site_bucket: String,
    pub deploy_role: String,
    pub output_namespace: String,
    pub stack_outputs_artifact: String,
    pub site_artifact: String,
}

impl ResourceNames {
    pub fn new(app_name: &str, environment: Environment) -> Self {
        let env = environment.name();
        let kebab = format!("{}-{}", kebab_case(app_name), environment.slug());

        Self {
            environment,
            stack_name: format!("{app_name}-{env}"),
            table_name: format!("{kebab}-walls"),
            site_bucket: format!("{kebab}-site"),
            deploy_role: format!("{app_name}-{env}-DeployRole"),
            output_namespace: format!("{app_name}{env}Stack"),
            stack_outputs_artifact: format!("{app_name}-{env}-StackOutputs"),
            site_artifact: format!("{app_name}-{env}-Site"),
        }
    }

    /// Every name in this set, for collision checks
    pub fn all(&self) -> [&str; 7] {
        [
            &self.stack_name,
            &self.table_name,
            &self.site_bucket,
            &self.deploy_role,
            &self.output_namespace,
            &self.stack_outputs_artifact,
            &self.site_artifact,
        ]
    }
}

/// `VirtualWall` -> `virtual-wall`
fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' || ch == ' ' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}
