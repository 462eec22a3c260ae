use serde::{Deserialize, Serialize};

use crate::binding::SnapshotEnvironmentBinding;
use crate::component::Component;
use crate::environment::Environment;
use crate::meta::ObjectMeta;
use crate::promotion::PromotionRun;

/// The resource kinds guarded by the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Component,
    Environment,
    PromotionRun,
    SnapshotEnvironmentBinding,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Component,
        ResourceKind::Environment,
        ResourceKind::PromotionRun,
        ResourceKind::SnapshotEnvironmentBinding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Component => "Component",
            ResourceKind::Environment => "Environment",
            ResourceKind::PromotionRun => "PromotionRun",
            ResourceKind::SnapshotEnvironmentBinding => "SnapshotEnvironmentBinding",
        }
    }

    /// Lower-case plural used in routes and store keys.
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Component => "components",
            ResourceKind::Environment => "environments",
            ResourceKind::PromotionRun => "promotionruns",
            ResourceKind::SnapshotEnvironmentBinding => "snapshotenvironmentbindings",
        }
    }

    /// Resolve a kind from its plural, its singular or its CamelCase name.
    pub fn parse(value: &str) -> Option<ResourceKind> {
        let lower = value.to_ascii_lowercase();
        ResourceKind::ALL.into_iter().find(|kind| {
            kind.plural() == lower
                || kind.as_str().eq_ignore_ascii_case(&lower)
                || kind.plural().trim_end_matches('s') == lower
        })
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any guarded resource, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AnyResource {
    Component(Component),
    Environment(Environment),
    PromotionRun(PromotionRun),
    SnapshotEnvironmentBinding(SnapshotEnvironmentBinding),
}

impl AnyResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AnyResource::Component(_) => ResourceKind::Component,
            AnyResource::Environment(_) => ResourceKind::Environment,
            AnyResource::PromotionRun(_) => ResourceKind::PromotionRun,
            AnyResource::SnapshotEnvironmentBinding(_) => ResourceKind::SnapshotEnvironmentBinding,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            AnyResource::Component(r) => &r.metadata,
            AnyResource::Environment(r) => &r.metadata,
            AnyResource::PromotionRun(r) => &r.metadata,
            AnyResource::SnapshotEnvironmentBinding(r) => &r.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            AnyResource::Component(r) => &mut r.metadata,
            AnyResource::Environment(r) => &mut r.metadata,
            AnyResource::PromotionRun(r) => &mut r.metadata,
            AnyResource::SnapshotEnvironmentBinding(r) => &mut r.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata().namespace
    }
}

/// A concrete resource type that can be moved in and out of [`AnyResource`].
pub trait Resource: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn metadata(&self) -> &ObjectMeta;

    fn from_any(resource: AnyResource) -> Option<Self>;

    fn into_any(self) -> AnyResource;
}

macro_rules! impl_resource {
    ($ty:ident) => {
        impl Resource for $ty {
            const KIND: ResourceKind = ResourceKind::$ty;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn from_any(resource: AnyResource) -> Option<Self> {
                match resource {
                    AnyResource::$ty(r) => Some(r),
                    _ => None,
                }
            }

            fn into_any(self) -> AnyResource {
                AnyResource::$ty(self)
            }
        }
    };
}

impl_resource!(Component);
impl_resource!(Environment);
impl_resource!(PromotionRun);
impl_resource!(SnapshotEnvironmentBinding);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kind_names() {
        assert_eq!(ResourceKind::parse("components"), Some(ResourceKind::Component));
        assert_eq!(ResourceKind::parse("component"), Some(ResourceKind::Component));
        assert_eq!(
            ResourceKind::parse("SnapshotEnvironmentBinding"),
            Some(ResourceKind::SnapshotEnvironmentBinding)
        );
        assert_eq!(
            ResourceKind::parse("promotionruns"),
            Some(ResourceKind::PromotionRun)
        );
        assert_eq!(ResourceKind::parse("pods"), None);
    }

    #[test]
    fn kind_tag_round_trips_through_json() {
        let json = serde_json::json!({
            "apiVersion": "appstudio.redhat.com/v1alpha1",
            "kind": "SnapshotEnvironmentBinding",
            "metadata": { "name": "seb1", "namespace": "team-a" },
            "spec": { "application": "app", "environment": "env", "snapshot": "snap" }
        });
        let resource: AnyResource = serde_json::from_value(json).unwrap();
        assert_eq!(resource.kind(), ResourceKind::SnapshotEnvironmentBinding);
        assert_eq!(resource.metadata().key(), "team-a/seb1");

        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["kind"], "SnapshotEnvironmentBinding");
        assert_eq!(value["spec"]["environment"], "env");
    }

    #[test]
    fn from_any_rejects_other_kinds() {
        let env = AnyResource::Environment(Environment::default());
        assert!(Component::from_any(env.clone()).is_none());
        assert!(Environment::from_any(env).is_some());
    }
}
