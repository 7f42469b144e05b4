//! Delivery pipeline builder
//!
//! `build_pipeline` turns an explicit environment list into the
//! Source -> Build -> DeployTo<Env>... topology. Every deploy stage comes from
//! the same template, and each one takes all of its names from its
//! environment's [`ResourceNames`], so no two stages share an artifact,
//! namespace or role.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::environment::{Environment, ResourceNames};
use crate::domain::pipeline::{
    Action, ActionKind, ArtifactName, OutputRef, PipelineTopology, Stage, TopologyError, Variable,
};

pub const SOURCE_STAGE: &str = "Source";
pub const BUILD_STAGE: &str = "Build";

pub const SOURCE_ACTION: &str = "GitHub_Source";
pub const SITE_BUILD_ACTION: &str = "SiteBuild";
pub const LAMBDA_BUILD_ACTION: &str = "LambdaBuild";
pub const CDK_BUILD_ACTION: &str = "CdkBuild";

pub const DEPLOY_STACK_ACTION: &str = "DeployStack";
pub const BUILD_SITE_ACTION: &str = "BuildSite";
pub const DEPLOY_SITE_ACTION: &str = "DeploySite";

/// Stack output carrying the public API endpoint
pub const API_ENDPOINT_OUTPUT: &str = "ApiEndpoint";

/// Repository the Source stage fetches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Secret holding the repository access token
    pub token_secret: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: "Virtual-Wall-Org".to_string(),
            repo: "virtual-wall".to_string(),
            branch: "master".to_string(),
            token_secret: "virtual-wall-secrets/github/token".to_string(),
        }
    }
}

/// Input to [`build_pipeline`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub app_name: String,
    pub source: SourceConfig,
    /// Deploy stages, in promotion order
    pub environments: Vec<Environment>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            app_name: "VirtualWall".to_string(),
            source: SourceConfig::default(),
            environments: vec![Environment::Test, Environment::Prod],
        }
    }
}

/// Artifacts written by the Source and Build stages
#[derive(Debug, Clone)]
struct SharedArtifacts {
    source: ArtifactName,
    site_build: ArtifactName,
    lambda_build: ArtifactName,
    cdk_build: ArtifactName,
}

impl SharedArtifacts {
    fn new(app_name: &str) -> Self {
        let name = |suffix: &str| ArtifactName::new(format!("{app_name}-{suffix}"));
        Self {
            source: name("Source"),
            site_build: name("SiteBuild"),
            lambda_build: name("LambdaBuild"),
            cdk_build: name("CdkBuild"),
        }
    }
}

/// Name of the deploy stage for an environment
pub fn deploy_stage_name(environment: Environment) -> String {
    format!("DeployTo{}", environment.name())
}

/// Build the pipeline topology
pub fn build_pipeline(config: &PipelineConfig) -> Result<PipelineTopology, TopologyError> {
    if config.environments.is_empty() {
        return Err(TopologyError::NoEnvironments);
    }

    let mut seen = BTreeSet::new();
    for &environment in &config.environments {
        if !environment.is_deployable() {
            return Err(TopologyError::NotDeployable(environment));
        }
        if !seen.insert(environment) {
            return Err(TopologyError::DuplicateEnvironment(environment));
        }
    }

    let artifacts = SharedArtifacts::new(&config.app_name);

    let mut stages = vec![
        source_stage(&config.source, &artifacts),
        build_stage(&config.app_name, &artifacts),
    ];
    stages.extend(
        config
            .environments
            .iter()
            .map(|&env| deploy_stage(&ResourceNames::new(&config.app_name, env), &artifacts)),
    );

    PipelineTopology::new(format!("{}-Pipeline", config.app_name), stages)
}

fn source_stage(source: &SourceConfig, artifacts: &SharedArtifacts) -> Stage {
    let kind = ActionKind::Source {
        owner: source.owner.clone(),
        repo: source.repo.clone(),
        branch: source.branch.clone(),
        token_secret: source.token_secret.clone(),
    };
    Stage::new(
        SOURCE_STAGE,
        None,
        vec![Action::new(SOURCE_ACTION, kind).output(&artifacts.source)],
    )
}

fn build_stage(app_name: &str, artifacts: &SharedArtifacts) -> Stage {
    let project = |suffix: &str| format!("{app_name}-{suffix}");
    let commands = |cmds: &[&str]| cmds.iter().map(|c| c.to_string()).collect::<Vec<_>>();

    // The three builds share run order 1 and may finish in any order
    let site = Action::new(
        SITE_BUILD_ACTION,
        ActionKind::Build {
            project: project("SiteBuild"),
            commands: commands(&["npm ci", "npm run build", "npm run test"]),
            variables: BTreeMap::new(),
        },
    )
    .input(&artifacts.source)
    .output(&artifacts.site_build);

    let lambda = Action::new(
        LAMBDA_BUILD_ACTION,
        ActionKind::Build {
            project: project("LambdaBuild"),
            commands: commands(&["cargo test --workspace", "cargo build --release -p wall-api"]),
            variables: BTreeMap::new(),
        },
    )
    .input(&artifacts.source)
    .output(&artifacts.lambda_build);

    let cdk = Action::new(
        CDK_BUILD_ACTION,
        ActionKind::Build {
            project: project("CdkBuild"),
            commands: commands(&["npm ci", "npm run build", "npx cdk synth -o dist"]),
            variables: BTreeMap::new(),
        },
    )
    .input(&artifacts.source)
    .output(&artifacts.cdk_build);

    Stage::new(BUILD_STAGE, None, vec![site, lambda, cdk])
}

fn deploy_stage(names: &ResourceNames, artifacts: &SharedArtifacts) -> Stage {
    let stack_outputs = ArtifactName::new(names.stack_outputs_artifact.clone());
    let site = ArtifactName::new(names.site_artifact.clone());

    let deploy_stack = Action::new(
        DEPLOY_STACK_ACTION,
        ActionKind::DeployStack {
            stack_name: names.stack_name.clone(),
            template_path: format!("{}::dist/{}.template.json", artifacts.cdk_build, names.stack_name),
        },
    )
    .run_order(1)
    .input(&artifacts.cdk_build)
    .input(&artifacts.lambda_build)
    .output(&stack_outputs)
    .namespace(names.output_namespace.clone())
    .role(names.deploy_role.clone());

    let mut variables = BTreeMap::new();
    variables.insert(
        "API_URL".to_string(),
        Variable::Output(OutputRef {
            namespace: names.output_namespace.clone(),
            key: API_ENDPOINT_OUTPUT.to_string(),
        }),
    );
    variables.insert(
        "ENVIRONMENT".to_string(),
        Variable::Plain(names.environment.slug().to_string()),
    );

    let build_site = Action::new(
        BUILD_SITE_ACTION,
        ActionKind::Build {
            project: format!("{}-SiteBundle", names.stack_name),
            commands: vec!["npm ci".to_string(), "npm run bundle -- --api-url \"$API_URL\"".to_string()],
            variables,
        },
    )
    .run_order(2)
    .input(&artifacts.site_build)
    .input(&stack_outputs)
    .output(&site)
    .role(names.deploy_role.clone());

    let deploy_site = Action::new(
        DEPLOY_SITE_ACTION,
        ActionKind::DeploySite {
            bucket: names.site_bucket.clone(),
            extract: true,
        },
    )
    .run_order(3)
    .input(&site)
    .role(names.deploy_role.clone());

    Stage::new(
        deploy_stage_name(names.environment),
        Some(names.environment),
        vec![deploy_stack, build_site, deploy_site],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn default_topology() -> PipelineTopology {
        build_pipeline(&PipelineConfig::default()).unwrap()
    }

    /// Every name a deploy stage owns: artifacts, namespaces and roles
    fn owned_names(stage: &Stage) -> HashSet<String> {
        let mut names = HashSet::new();
        for action in &stage.actions {
            names.extend(action.outputs.iter().map(|a| a.to_string()));
            names.extend(action.namespace.clone());
            names.extend(action.role.clone());
        }
        names
    }

    #[test]
    fn test_stage_order() {
        let topology = default_topology();
        let names: Vec<&str> = topology.stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Source", "Build", "DeployToTest", "DeployToProd"]);
        assert_eq!(topology.name(), "VirtualWall-Pipeline");
    }

    #[test]
    fn test_environment_order_follows_config() {
        let config = PipelineConfig {
            environments: vec![Environment::Prod],
            ..PipelineConfig::default()
        };
        let topology = build_pipeline(&config).unwrap();
        assert_eq!(topology.stages().len(), 3);
        assert!(topology.stage_for(Environment::Prod).is_some());
        assert!(topology.stage_for(Environment::Test).is_none());
    }

    #[test]
    fn test_build_actions_are_parallel_and_read_source() {
        let topology = default_topology();
        let build = topology.stage(BUILD_STAGE).unwrap();
        let waves = build.waves();

        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].actions.len(), 3);
        let source = &topology.action(SOURCE_STAGE, SOURCE_ACTION).unwrap().outputs[0];
        for action in &build.actions {
            assert_eq!(action.inputs, vec![source.clone()]);
            assert_eq!(action.outputs.len(), 1);
        }
    }

    #[test]
    fn test_deploy_stage_run_orders() {
        let topology = default_topology();
        let stage = topology.stage("DeployToTest").unwrap();
        let order: Vec<(&str, u32)> = stage
            .actions
            .iter()
            .map(|a| (a.name.as_str(), a.run_order))
            .collect();
        assert_eq!(
            order,
            vec![(DEPLOY_STACK_ACTION, 1), (BUILD_SITE_ACTION, 2), (DEPLOY_SITE_ACTION, 3)]
        );
    }

    #[test]
    fn test_build_site_reads_stack_outputs() {
        let topology = default_topology();
        for env in [Environment::Test, Environment::Prod] {
            let stage = topology.stage_for(env).unwrap();
            let stack = stage.action(DEPLOY_STACK_ACTION).unwrap();
            let site = stage.action(BUILD_SITE_ACTION).unwrap();

            assert!(stack.run_order < site.run_order);
            assert!(site.inputs.contains(&stack.outputs[0]));

            let refs = site.output_refs();
            assert_eq!(refs.len(), 1);
            assert_eq!(Some(&refs[0].namespace), stack.namespace.as_ref());
            assert_eq!(refs[0].key, API_ENDPOINT_OUTPUT);
        }
    }

    #[test]
    fn test_deploy_site_reads_bundle() {
        let topology = default_topology();
        let stage = topology.stage("DeployToProd").unwrap();
        let bundle = &stage.action(BUILD_SITE_ACTION).unwrap().outputs[0];
        let deploy = stage.action(DEPLOY_SITE_ACTION).unwrap();

        assert_eq!(deploy.inputs, vec![bundle.clone()]);
        assert_eq!(
            deploy.kind,
            ActionKind::DeploySite {
                bucket: "virtual-wall-prod-site".to_string(),
                extract: true,
            }
        );
    }

    #[test]
    fn test_environments_are_disjoint() {
        let topology = default_topology();
        let test = owned_names(topology.stage_for(Environment::Test).unwrap());
        let prod = owned_names(topology.stage_for(Environment::Prod).unwrap());

        assert!(!test.is_empty());
        assert!(test.is_disjoint(&prod), "shared: {:?}", test.intersection(&prod).collect::<Vec<_>>());
    }

    #[test]
    fn test_deploy_roles_differ_per_environment() {
        let topology = default_topology();
        let role = |env| {
            topology
                .stage_for(env)
                .unwrap()
                .actions
                .iter()
                .map(|a| a.role.clone())
                .collect::<HashSet<_>>()
        };

        let test = role(Environment::Test);
        let prod = role(Environment::Prod);
        assert_eq!(test.len(), 1);
        assert_eq!(prod.len(), 1);
        assert!(test.is_disjoint(&prod));
    }

    #[test]
    fn test_every_artifact_is_consumed() {
        let topology = default_topology();
        let read: HashSet<&ArtifactName> = topology
            .stages()
            .iter()
            .flat_map(|s| &s.actions)
            .flat_map(|a| &a.inputs)
            .collect();

        for artifact in topology.artifacts() {
            assert!(read.contains(artifact), "{artifact} is never read");
        }
    }

    #[test]
    fn test_rejects_bad_environment_lists() {
        let with = |environments: Vec<Environment>| {
            build_pipeline(&PipelineConfig {
                environments,
                ..PipelineConfig::default()
            })
        };

        assert_eq!(with(vec![]).unwrap_err(), TopologyError::NoEnvironments);
        assert_eq!(
            with(vec![Environment::Test, Environment::Test]).unwrap_err(),
            TopologyError::DuplicateEnvironment(Environment::Test)
        );
        assert_eq!(
            with(vec![Environment::Local]).unwrap_err(),
            TopologyError::NotDeployable(Environment::Local)
        );
    }

    #[test]
    fn test_building_twice_is_identical() {
        assert_eq!(default_topology(), default_topology());
    }

    #[test]
    fn test_serialized_topology_shape() {
        let value = serde_json::to_value(default_topology()).unwrap();
        let stack = &value["stages"][2]["actions"][0];

        assert_eq!(stack["name"], DEPLOY_STACK_ACTION);
        assert_eq!(stack["kind"], "deploy_stack");
        assert_eq!(stack["run_order"], 1);
        assert_eq!(stack["namespace"], "VirtualWallTestStack");
        assert_eq!(value["stages"][2]["environment"], "test");

        let site = &value["stages"][2]["actions"][1];
        assert_eq!(site["variables"]["API_URL"]["type"], "output");
        assert_eq!(site["variables"]["API_URL"]["value"]["key"], API_ENDPOINT_OUTPUT);
    }
}
