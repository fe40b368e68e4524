//! Dry-run validation of a single request against the state store.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use tracing::info;
use warden_core::ValidatorConfig;
use warden_state::{Catalog, Cluster, ClusterId, NodeGroup, NodeGroupId, StateStore, VmwareAttributes};
use warden_validate::{Request, Validators};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RequestKind {
    ClusterCreate,
    ClusterUpdate,
    Attributes,
    VmwareAttributes,
    NodeGroupCreate,
    NodeGroupUpdate,
    NodeGroupDelete,
    Changes,
}

impl RequestKind {
    fn needs_body(self) -> bool {
        !matches!(self, RequestKind::NodeGroupDelete | RequestKind::Changes)
    }
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Kind of request to validate.
    #[arg(value_enum)]
    pub kind: RequestKind,

    /// Request body (JSON).
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Target environment id.
    #[arg(long)]
    pub cluster: Option<ClusterId>,

    /// Target node group id.
    #[arg(long)]
    pub node_group: Option<NodeGroupId>,

    /// Force a node group delete.
    #[arg(long)]
    pub force: bool,
}

/// Records a request may target, loaded up front.
#[derive(Default)]
struct Targets {
    cluster: Option<Cluster>,
    node_group: Option<NodeGroup>,
    vmware: Option<VmwareAttributes>,
}

impl Targets {
    fn load(store: &StateStore, args: &CheckArgs) -> anyhow::Result<Self> {
        let mut targets = Targets::default();
        if let Some(id) = args.cluster {
            let cluster = store
                .cluster(id)?
                .with_context(|| format!("environment {id} not found"))?;
            if args.kind == RequestKind::VmwareAttributes {
                targets.vmware = store.vmware_attributes(id)?;
            }
            targets.cluster = Some(cluster);
        }
        if let Some(id) = args.node_group {
            let group = store
                .node_group(id)?
                .with_context(|| format!("node group {id} not found"))?;
            targets.node_group = Some(group);
        }
        Ok(targets)
    }

    fn cluster(&self) -> anyhow::Result<&Cluster> {
        self.cluster.as_ref().context("--cluster is required for this request")
    }

    fn node_group(&self) -> anyhow::Result<&NodeGroup> {
        self.node_group
            .as_ref()
            .context("--node-group is required for this request")
    }
}

fn build_request<'a>(
    args: &CheckArgs,
    data: &'a [u8],
    targets: &'a Targets,
) -> anyhow::Result<Request<'a>> {
    let request = match args.kind {
        RequestKind::ClusterCreate => Request::ClusterCreate { data },
        RequestKind::ClusterUpdate => Request::ClusterUpdate {
            data,
            instance: targets.cluster()?,
        },
        RequestKind::Attributes => Request::AttributesUpdate {
            data,
            cluster: targets.cluster.as_ref(),
        },
        RequestKind::VmwareAttributes => {
            targets.cluster()?;
            Request::VmwareAttributesUpdate {
                data,
                instance: targets
                    .vmware
                    .as_ref()
                    .context("environment has no vmware attributes")?,
            }
        }
        RequestKind::NodeGroupCreate => Request::NodeGroupCreate { data },
        RequestKind::NodeGroupUpdate => Request::NodeGroupUpdate {
            data,
            instance: targets.node_group()?,
        },
        RequestKind::NodeGroupDelete => Request::NodeGroupDelete {
            instance: targets.node_group()?,
            force: args.force,
        },
        RequestKind::Changes => Request::ClusterChanges {
            cluster: targets.cluster()?,
        },
    };
    Ok(request)
}

/// Validate the request and print the accepted payload.
pub fn run(store: &StateStore, config: &ValidatorConfig, args: &CheckArgs) -> anyhow::Result<()> {
    let data = match &args.file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        None if args.kind.needs_body() => bail!("--file is required for this request"),
        None => Vec::new(),
    };
    let targets = Targets::load(store, args)?;
    let request = build_request(args, &data, &targets)?;

    match Validators::new(store, config).validate(request) {
        Ok(accepted) => {
            info!(request = request.name(), "request accepted");
            println!("{}", serde_json::to_string_pretty(&accepted)?);
            Ok(())
        }
        Err(e) => bail!("{} rejected ({}): {e}", request.name(), e.kind().as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_state::{NetProvider, Release};

    fn store() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_release(&Release {
                id: 1,
                name: "Liberty on Ubuntu".to_string(),
                operating_system: "Ubuntu".to_string(),
                version: "liberty-8.0".to_string(),
                environment_version: "8.0".to_string(),
                deployable: true,
                modes: vec!["ha_compact".to_string()],
                can_update_from_versions: Vec::new(),
                components: Vec::new(),
            })
            .unwrap();
        store
            .put_cluster(&Cluster {
                id: 1,
                name: "prod".to_string(),
                release_id: 1,
                pending_release_id: None,
                mode: "ha_compact".to_string(),
                net_provider: NetProvider::Neutron,
                is_locked: false,
                editable: Default::default(),
            })
            .unwrap();
        store
    }

    fn args(kind: RequestKind, file: Option<PathBuf>) -> CheckArgs {
        CheckArgs {
            kind,
            file,
            cluster: None,
            node_group: None,
            force: false,
        }
    }

    fn body_file(value: serde_json::Value) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_vec(&value).unwrap()).unwrap();
        file
    }

    #[test]
    fn accepted_cluster_create() {
        let store = store();
        let file = body_file(json!({"name": "staging", "release": 1}));
        let args = args(RequestKind::ClusterCreate, Some(file.path().to_path_buf()));
        run(&store, &ValidatorConfig::default(), &args).unwrap();
    }

    #[test]
    fn rejection_names_kind() {
        let store = store();
        let file = body_file(json!({"name": "prod", "release": 1}));
        let args = args(RequestKind::ClusterCreate, Some(file.path().to_path_buf()));
        let err = run(&store, &ValidatorConfig::default(), &args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cluster_create rejected (already_exists): Environment with this name already exists"
        );
    }

    #[test]
    fn body_required_for_updates() {
        let store = store();
        let err = run(&store, &ValidatorConfig::default(), &args(RequestKind::ClusterUpdate, None))
            .unwrap_err();
        assert!(err.to_string().contains("--file"));
    }

    #[test]
    fn changes_need_cluster_target() {
        let store = store();
        let mut changes = args(RequestKind::Changes, None);
        assert!(run(&store, &ValidatorConfig::default(), &changes).is_err());

        changes.cluster = Some(1);
        run(&store, &ValidatorConfig::default(), &changes).unwrap();
    }

    #[test]
    fn unknown_cluster_target() {
        let store = store();
        let mut changes = args(RequestKind::Changes, None);
        changes.cluster = Some(8);
        let err = run(&store, &ValidatorConfig::default(), &changes).unwrap_err();
        assert_eq!(err.to_string(), "environment 8 not found");
    }
}
