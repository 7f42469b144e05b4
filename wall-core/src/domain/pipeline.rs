//! Pipeline topology types
//!
//! A topology is pure data: ordered stages of actions that read and write
//! named artifacts. Whatever engine executes it owns retries and aborts; the
//! types here only carry ordering and artifact dependencies.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::domain::environment::Environment;

/// Name of an immutable bundle passed between actions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deploy-time output published by an earlier action, such as an API URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub namespace: String,
    pub key: String,
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{{{}.{}}}", self.namespace, self.key)
    }
}

/// Value bound to a build environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Variable {
    Plain(String),
    Output(OutputRef),
}

/// What an action does when the engine runs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Fetch a repository snapshot
    Source {
        owner: String,
        repo: String,
        branch: String,
        token_secret: String,
    },
    /// Run commands in a build project
    Build {
        project: String,
        commands: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        variables: BTreeMap<String, Variable>,
    },
    /// Create or update an infrastructure stack
    DeployStack {
        stack_name: String,
        template_path: String,
    },
    /// Copy a bundle into a site bucket
    DeploySite { bucket: String, extract: bool },
}

/// One unit of work inside a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    /// Actions in a stage run in ascending run order; equal orders run in parallel
    pub run_order: u32,
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ArtifactName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ArtifactName>,
    /// Namespace under which this action publishes its outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Role the action assumes; `None` means the pipeline's own role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            run_order: 1,
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            namespace: None,
            role: None,
        }
    }

    pub fn run_order(mut self, run_order: u32) -> Self {
        self.run_order = run_order;
        self
    }

    pub fn input(mut self, artifact: &ArtifactName) -> Self {
        self.inputs.push(artifact.clone());
        self
    }

    pub fn output(mut self, artifact: &ArtifactName) -> Self {
        self.outputs.push(artifact.clone());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Outputs of other actions this action reads through its variables
    pub fn output_refs(&self) -> Vec<&OutputRef> {
        match &self.kind {
            ActionKind::Build { variables, .. } => variables
                .values()
                .filter_map(|v| match v {
                    Variable::Output(output) => Some(output),
                    Variable::Plain(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A named group of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    pub actions: Vec<Action>,
}

impl Stage {
    pub fn new(name: impl Into<String>, environment: Option<Environment>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            environment,
            actions,
        }
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Actions grouped by run order, ascending
    pub fn waves(&self) -> Vec<Wave<'_>> {
        let mut grouped: BTreeMap<u32, Vec<&Action>> = BTreeMap::new();
        for action in &self.actions {
            grouped.entry(action.run_order).or_default().push(action);
        }
        grouped
            .into_iter()
            .map(|(run_order, actions)| Wave { run_order, actions })
            .collect()
    }
}

/// Actions of one stage that share a run order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave<'a> {
    pub run_order: u32,
    pub actions: Vec<&'a Action>,
}

/// Execution order of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStage<'a> {
    pub name: &'a str,
    pub waves: Vec<Wave<'a>>,
}

/// Ways a topology can break its ordering rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("the pipeline needs at least one deploy environment")]
    NoEnvironments,
    #[error("environment {0} is listed more than once")]
    DuplicateEnvironment(Environment),
    #[error("environment {0} cannot be deployed by the pipeline")]
    NotDeployable(Environment),
    #[error("the pipeline has no stages")]
    NoStages,
    #[error("stage {0} appears more than once")]
    DuplicateStage(String),
    #[error("stage {0} has no actions")]
    EmptyStage(String),
    #[error("action {action} appears more than once in stage {stage}")]
    DuplicateAction { stage: String, action: String },
    #[error("action {stage}/{action} has run order 0")]
    InvalidRunOrder { stage: String, action: String },
    #[error("artifact {artifact} is written by both {first} and {second}")]
    ArtifactWrittenTwice {
        artifact: ArtifactName,
        first: String,
        second: String,
    },
    #[error("action {reader} reads artifact {artifact} before anything writes it")]
    ArtifactReadBeforeWrite {
        artifact: ArtifactName,
        reader: String,
    },
    #[error("namespace {namespace} is published by both {first} and {second}")]
    NamespacePublishedTwice {
        namespace: String,
        first: String,
        second: String,
    },
    #[error("action {reader} reads {output} before anything publishes it")]
    OutputReadBeforePublish { output: String, reader: String },
}

/// Immutable, validated pipeline description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineTopology {
    name: String,
    stages: Vec<Stage>,
}

impl PipelineTopology {
    /// Assemble a topology, rejecting any ordering violation
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self, TopologyError> {
        let topology = Self {
            name: name.into(),
            stages,
        };
        topology.validate()?;
        Ok(topology)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stage_for(&self, environment: Environment) -> Option<&Stage> {
        self.stages
            .iter()
            .find(|s| s.environment == Some(environment))
    }

    pub fn action(&self, stage: &str, action: &str) -> Option<&Action> {
        self.stage(stage).and_then(|s| s.action(action))
    }

    /// Every artifact written anywhere in the pipeline
    pub fn artifacts(&self) -> BTreeSet<&ArtifactName> {
        self.stages
            .iter()
            .flat_map(|s| &s.actions)
            .flat_map(|a| &a.outputs)
            .collect()
    }

    /// Execution waves, stage by stage
    pub fn plan(&self) -> Vec<PlannedStage<'_>> {
        self.stages
            .iter()
            .map(|stage| PlannedStage {
                name: &stage.name,
                waves: stage.waves(),
            })
            .collect()
    }

    /// Check the ordering rules
    ///
    /// Stage and action names are unique, run orders are positive, every
    /// artifact and output namespace is produced exactly once, and nothing is
    /// read before a strictly earlier wave produced it.
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.stages.is_empty() {
            return Err(TopologyError::NoStages);
        }

        let mut stage_names = BTreeSet::new();
        let mut written: BTreeMap<&ArtifactName, String> = BTreeMap::new();
        let mut published: BTreeMap<&str, String> = BTreeMap::new();

        for stage in &self.stages {
            if !stage_names.insert(stage.name.as_str()) {
                return Err(TopologyError::DuplicateStage(stage.name.clone()));
            }
            if stage.actions.is_empty() {
                return Err(TopologyError::EmptyStage(stage.name.clone()));
            }

            let mut action_names = BTreeSet::new();
            for action in &stage.actions {
                if !action_names.insert(action.name.as_str()) {
                    return Err(TopologyError::DuplicateAction {
                        stage: stage.name.clone(),
                        action: action.name.clone(),
                    });
                }
                if action.run_order == 0 {
                    return Err(TopologyError::InvalidRunOrder {
                        stage: stage.name.clone(),
                        action: action.name.clone(),
                    });
                }
            }

            for wave in stage.waves() {
                // Reads only see what earlier waves produced
                for &action in &wave.actions {
                    let location = format!("{}/{}", stage.name, action.name);
                    for input in &action.inputs {
                        if !written.contains_key(input) {
                            return Err(TopologyError::ArtifactReadBeforeWrite {
                                artifact: input.clone(),
                                reader: location,
                            });
                        }
                    }
                    for output in action.output_refs() {
                        if !published.contains_key(output.namespace.as_str()) {
                            return Err(TopologyError::OutputReadBeforePublish {
                                output: output.to_string(),
                                reader: location,
                            });
                        }
                    }
                }

                for &action in &wave.actions {
                    let location = format!("{}/{}", stage.name, action.name);
                    for output in &action.outputs {
                        if let Some(first) = written.insert(output, location.clone()) {
                            return Err(TopologyError::ArtifactWrittenTwice {
                                artifact: output.clone(),
                                first,
                                second: location,
                            });
                        }
                    }
                    if let Some(namespace) = &action.namespace {
                        if let Some(first) = published.insert(namespace.as_str(), location.clone()) {
                            return Err(TopologyError::NamespacePublishedTwice {
                                namespace: namespace.clone(),
                                first,
                                second: location,
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
