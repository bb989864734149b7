//! Controller owner references.
//!
//! Links a dependent object to the resource that manages it so the API
//! server garbage-collects the dependent when the owner goes away. Only the
//! reference is written here; cascading deletion is the API server's job.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;
use thiserror::Error;

/// Reasons a controller reference cannot be set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnerReferenceError {
    /// Owner has not been persisted yet (no name or uid)
    #[error("{kind} owner is missing a name or uid")]
    MissingIdentity {
        /// Kind of the owner
        kind: String,
    },

    /// Namespaced owner in a different namespace than the dependent
    #[error(
        "cross-namespace owner references are disallowed, owner's namespace \
         {owner_namespace}, obj's namespace {child_namespace}"
    )]
    CrossNamespace {
        /// Namespace of the owner
        owner_namespace: String,
        /// Namespace of the dependent (empty when cluster-scoped)
        child_namespace: String,
    },

    /// Dependent is already controlled by a different object
    #[error("object {child} is already owned by another {kind} controller {name}")]
    AlreadyOwned {
        /// `namespace/name` of the dependent
        child: String,
        /// Kind of the existing controller
        kind: String,
        /// Name of the existing controller
        name: String,
    },
}

/// API group of an `apiVersion` string (`""` for the core group).
fn api_group(api_version: &str) -> &str {
    api_version.split_once('/').map_or("", |(group, _)| group)
}

/// Whether two references point at the same object (same group, kind, name).
fn refers_to_same_object(a: &OwnerReference, b: &OwnerReference) -> bool {
    api_group(&a.api_version) == api_group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

/// Sets `owner` as the controller of the object described by `child`.
///
/// Any existing reference to the same owner is replaced in place. Fails when
/// the owner has no uid yet, when a namespaced owner lives in another
/// namespace, or when `child` already has a different controller.
pub fn set_controller_reference<K>(
    owner: &K,
    child: &mut ObjectMeta,
) -> Result<(), OwnerReferenceError>
where
    K: Resource<DynamicType = ()>,
{
    let reference = owner
        .controller_owner_ref(&())
        .ok_or_else(|| OwnerReferenceError::MissingIdentity {
            kind: K::kind(&()).into_owned(),
        })?;
    let reference = OwnerReference {
        block_owner_deletion: Some(true),
        ..reference
    };

    if let Some(owner_namespace) = owner.meta().namespace.as_deref() {
        let child_namespace = child.namespace.as_deref().unwrap_or_default();
        if owner_namespace != child_namespace {
            return Err(OwnerReferenceError::CrossNamespace {
                owner_namespace: owner_namespace.to_string(),
                child_namespace: child_namespace.to_string(),
            });
        }
    }

    let references = child.owner_references.get_or_insert_with(Vec::new);
    if let Some(existing) = references
        .iter()
        .find(|r| r.controller == Some(true) && !refers_to_same_object(r, &reference))
    {
        return Err(OwnerReferenceError::AlreadyOwned {
            child: format!(
                "{}/{}",
                child.namespace.as_deref().unwrap_or_default(),
                child.name.as_deref().unwrap_or_default()
            ),
            kind: existing.kind.clone(),
            name: existing.name.clone(),
        });
    }

    match references.iter_mut().find(|r| refers_to_same_object(r, &reference)) {
        Some(slot) => *slot = reference,
        None => references.push(reference),
    }
    Ok(())
}

/// Merges `required` into `existing` by uid: matching entries are replaced,
/// everything else in `existing` is kept.
pub fn merge_owner_references(existing: &mut Vec<OwnerReference>, required: &[OwnerReference]) {
    for reference in required {
        match existing.iter_mut().find(|r| r.uid == reference.uid) {
            Some(slot) => *slot = reference.clone(),
            None => existing.push(reference.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_provisioning;

    fn child_meta(namespace: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some("metal3-state".to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sets_single_controller_reference() {
        let owner = create_test_provisioning(false);
        let mut child = child_meta("openshift-machine-api");

        set_controller_reference(&owner, &mut child).unwrap();

        let refs = child.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].api_version, "metal3.io/v1alpha1");
        assert_eq!(refs[0].kind, "Provisioning");
        assert_eq!(refs[0].name, "provisioning-configuration");
        assert_eq!(refs[0].controller, Some(true));
        assert_eq!(refs[0].block_owner_deletion, Some(true));
    }

    #[test]
    fn test_setting_twice_does_not_duplicate() {
        let owner = create_test_provisioning(false);
        let mut child = child_meta("openshift-machine-api");

        set_controller_reference(&owner, &mut child).unwrap();
        set_controller_reference(&owner, &mut child).unwrap();

        assert_eq!(child.owner_references.unwrap().len(), 1);
    }

    #[test]
    fn test_owner_without_uid_is_rejected() {
        let mut owner = create_test_provisioning(false);
        owner.metadata.uid = None;
        let mut child = child_meta("openshift-machine-api");

        let err = set_controller_reference(&owner, &mut child).unwrap_err();
        assert_eq!(
            err,
            OwnerReferenceError::MissingIdentity {
                kind: "Provisioning".to_string()
            }
        );
        assert!(child.owner_references.is_none());
    }

    #[test]
    fn test_namespaced_owner_in_other_namespace_is_rejected() {
        let mut owner = create_test_provisioning(false);
        owner.metadata.namespace = Some("elsewhere".to_string());
        let mut child = child_meta("openshift-machine-api");

        let err = set_controller_reference(&owner, &mut child).unwrap_err();
        assert!(matches!(err, OwnerReferenceError::CrossNamespace { .. }));
    }

    #[test]
    fn test_foreign_controller_is_rejected() {
        let owner = create_test_provisioning(false);
        let mut child = child_meta("openshift-machine-api");
        child.owner_references = Some(vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "someone-else".to_string(),
            uid: "other-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }]);

        let err = set_controller_reference(&owner, &mut child).unwrap_err();
        assert!(matches!(
            err,
            OwnerReferenceError::AlreadyOwned { ref name, .. } if name == "someone-else"
        ));
        assert!(err.to_string().contains("openshift-machine-api/metal3-state"));
    }

    #[test]
    fn test_non_controller_owner_is_kept() {
        let owner = create_test_provisioning(false);
        let mut child = child_meta("openshift-machine-api");
        child.owner_references = Some(vec![OwnerReference {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            name: "anchor".to_string(),
            uid: "anchor-uid".to_string(),
            controller: None,
            block_owner_deletion: None,
        }]);

        set_controller_reference(&owner, &mut child).unwrap();
        assert_eq!(child.owner_references.unwrap().len(), 2);
    }

    #[test]
    fn test_merge_replaces_by_uid_and_keeps_others() {
        let stale = OwnerReference {
            api_version: "metal3.io/v1alpha1".to_string(),
            kind: "Provisioning".to_string(),
            name: "provisioning-configuration".to_string(),
            uid: "prov-uid".to_string(),
            controller: None,
            block_owner_deletion: None,
        };
        let other = OwnerReference {
            uid: "other-uid".to_string(),
            name: "other".to_string(),
            ..stale.clone()
        };
        let required = OwnerReference {
            controller: Some(true),
            block_owner_deletion: Some(true),
            ..stale.clone()
        };
        let mut existing = vec![stale, other.clone()];

        merge_owner_references(&mut existing, std::slice::from_ref(&required));

        assert_eq!(existing, vec![required, other]);
    }
}
