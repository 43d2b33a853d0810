use std::sync::Arc;

use antecedent_backend::{ApiResourceEntry, ApiResourceList, BackendError, DynConnector, StatusReason};
use antecedent_backend_memory::MemoryCluster;
use antecedent_core::{
    ANTECEDENT_ANNOTATION, ClaimStatus, ErrorCategory, OwnershipError, OwnershipStatus,
    OwnershipVerifier, OwnershipWriter, ReleaseManifest, ResourceId, RetryPolicy,
};
use serde_json::json;

const MANIFEST: &str = r#"
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  color: blue
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 1
---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: edge
"#;

fn id() -> ResourceId {
    ResourceId::new("shop", "HelmRelease", "web")
}

fn connector(cluster: &MemoryCluster) -> DynConnector {
    Arc::new(cluster.clone())
}

fn verifier(cluster: &MemoryCluster) -> OwnershipVerifier {
    OwnershipVerifier::new(connector(cluster)).with_retry_policy(RetryPolicy::immediate(4))
}

fn object(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> serde_json::Value {
    let mut metadata = json!({"name": name});
    if let Some(ns) = namespace {
        metadata["namespace"] = json!(ns);
    }
    json!({"apiVersion": api_version, "kind": kind, "metadata": metadata})
}

fn annotated(
    api_version: &str,
    kind: &str,
    namespace: Option<&str>,
    name: &str,
    owner: &str,
) -> serde_json::Value {
    let mut value = object(api_version, kind, namespace, name);
    value["metadata"]["annotations"] = json!({ANTECEDENT_ANNOTATION: owner});
    value
}

/// Cluster holding the live objects of [`MANIFEST`], none annotated.
fn seeded_cluster() -> MemoryCluster {
    let cluster = MemoryCluster::with_builtin_resources();
    cluster.insert(object("v1", "ConfigMap", Some("shop"), "settings")).unwrap();
    cluster.insert(object("apps/v1", "Deployment", Some("shop"), "web")).unwrap();
    cluster.insert(object("v1", "Service", Some("edge"), "web")).unwrap();
    cluster
}

#[tokio::test]
async fn empty_manifest_is_unclaimed() {
    let cluster = MemoryCluster::with_builtin_resources();
    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new("", "shop"), &id())
        .await
        .unwrap();

    assert_eq!(status, OwnershipStatus::Unclaimed);
    assert!(status.is_owned_by_expected());
    assert_eq!(status.annotation_value(), "");
    assert_eq!(cluster.get_calls(), 0);
}

#[tokio::test]
async fn unannotated_resources_are_unclaimed() {
    let cluster = seeded_cluster();
    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    assert!(status.is_unclaimed());
    assert_eq!(cluster.get_calls(), 3);
}

#[tokio::test]
async fn matching_annotation_is_owned() {
    let cluster = seeded_cluster();
    cluster
        .insert(annotated("apps/v1", "Deployment", Some("shop"), "web", "shop:helmrelease/web"))
        .unwrap();

    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    assert!(status.is_owned_by_expected());
    assert_eq!(status.annotation_value(), "shop:helmrelease/web");
    match status {
        OwnershipStatus::Claimed { resource, .. } => assert_eq!(resource.kind, "Deployment"),
        OwnershipStatus::Unclaimed => panic!("expected a claim"),
    }
}

#[tokio::test]
async fn foreign_annotation_is_not_owned() {
    let cluster = seeded_cluster();
    cluster
        .insert(annotated("v1", "ConfigMap", Some("shop"), "settings", "other:helmrelease/web"))
        .unwrap();

    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    assert!(!status.is_owned_by_expected());
    assert_eq!(status.owner(), Some("other:helmrelease/web"));
}

#[tokio::test]
async fn first_annotated_resource_decides() {
    let cluster = seeded_cluster();
    cluster
        .insert(annotated("apps/v1", "Deployment", Some("shop"), "web", "shop:helmrelease/web"))
        .unwrap();
    cluster
        .insert(annotated("v1", "Service", Some("edge"), "web", "other:helmrelease/web"))
        .unwrap();

    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    assert!(status.is_owned_by_expected());
    // The Service after the first annotated object is never read.
    assert_eq!(cluster.get_calls(), 2);
}

#[tokio::test]
async fn empty_namespaces_default_to_release_namespace() {
    let cluster = MemoryCluster::with_builtin_resources();
    cluster
        .insert(annotated("v1", "ConfigMap", Some("shop"), "settings", "other:helmrelease/x"))
        .unwrap();
    cluster
        .insert(annotated("v1", "ConfigMap", Some("default"), "settings", "shop:helmrelease/web"))
        .unwrap();

    let manifest = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n";
    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(manifest, "shop"), &id())
        .await
        .unwrap();

    assert_eq!(status.owner(), Some("other:helmrelease/x"));
}

#[tokio::test]
async fn cluster_scoped_resources_are_read_without_namespace() {
    let cluster = MemoryCluster::with_builtin_resources();
    cluster
        .insert(annotated(
            "rbac.authorization.k8s.io/v1",
            "ClusterRole",
            None,
            "reader",
            "shop:helmrelease/web",
        ))
        .unwrap();

    let manifest = "apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata:\n  name: reader\n";
    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(manifest, "shop"), &id())
        .await
        .unwrap();

    assert!(status.is_owned_by_expected());
    assert_eq!(status.annotation_value(), "shop:helmrelease/web");
}

#[tokio::test]
async fn unknown_kinds_are_skipped() {
    let cluster = seeded_cluster();
    let manifest = r#"
apiVersion: example.com/v1
kind: Widget
metadata:
  name: gizmo
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
"#;
    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(manifest, "shop"), &id())
        .await
        .unwrap();

    assert!(status.is_unclaimed());
    assert_eq!(cluster.get_calls(), 1);
}

#[tokio::test]
async fn nameless_resource_aborts_verification() {
    let cluster = seeded_cluster();
    let manifest = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  generateName: anonymous-
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
"#;
    let err = verifier(&cluster)
        .verify(&ReleaseManifest::new(manifest, "shop"), &id())
        .await
        .unwrap_err();

    let OwnershipError::Fetch { resource, source } = &err else {
        panic!("expected fetch error, got {err:?}");
    };
    assert_eq!(resource.kind, "ConfigMap");
    assert!(resource.name.is_empty());
    assert_eq!(source.reason(), Some(StatusReason::BadRequest));
    assert!(!err.retries_exhausted());
    assert_eq!(err.category(), ErrorCategory::Fetch);
    assert_eq!(cluster.get_calls(), 0);
}

#[tokio::test]
async fn list_documents_are_verified_item_by_item() {
    let cluster = seeded_cluster();
    cluster
        .insert(annotated("v1", "Service", Some("shop"), "api", "other:helmrelease/api"))
        .unwrap();
    let manifest = r#"
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: settings
  - apiVersion: v1
    kind: Service
    metadata:
      name: api
"#;
    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(manifest, "shop"), &id())
        .await
        .unwrap();

    assert_eq!(status.owner(), Some("other:helmrelease/api"));
    assert_eq!(cluster.get_calls(), 2);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let cluster = seeded_cluster();
    cluster
        .insert(annotated("v1", "ConfigMap", Some("shop"), "settings", "shop:helmrelease/web"))
        .unwrap();
    cluster
        .fail_next_gets(
            "v1",
            "ConfigMap",
            Some("shop"),
            "settings",
            [
                BackendError::connection_reset("connection reset by peer"),
                BackendError::internal("etcdserver: leader changed"),
                BackendError::too_many_requests(None),
            ],
        )
        .unwrap();

    let status = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    assert!(status.is_owned_by_expected());
    assert_eq!(cluster.get_calls(), 4);
}

#[tokio::test]
async fn exhausted_retries_abort_verification() {
    let cluster = seeded_cluster();
    cluster
        .fail_next_gets(
            "v1",
            "ConfigMap",
            Some("shop"),
            "settings",
            (0..4).map(|n| BackendError::timeout(format!("attempt {n}"))),
        )
        .unwrap();

    let err = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap_err();

    assert!(err.retries_exhausted());
    assert_eq!(err.category(), ErrorCategory::RetriesExhausted);
    assert!(err.to_string().contains("attempt 3"));
    assert_eq!(cluster.get_calls(), 4);
}

#[tokio::test]
async fn terminal_failure_is_not_retried() {
    let cluster = seeded_cluster();
    cluster
        .fail_next_gets(
            "v1",
            "ConfigMap",
            Some("shop"),
            "settings",
            [BackendError::api(403, StatusReason::Forbidden, "configmaps is forbidden")],
        )
        .unwrap();

    let err = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap_err();

    assert!(matches!(err, OwnershipError::Fetch { .. }));
    assert!(!err.retries_exhausted());
    assert_eq!(cluster.get_calls(), 1);
}

#[tokio::test]
async fn missing_object_aborts_verification() {
    let cluster = MemoryCluster::with_builtin_resources();
    let err = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap_err();

    assert!(err.backend_error().is_not_found());
    match err {
        OwnershipError::Fetch { resource, .. } => assert_eq!(resource.name, "settings"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn connection_failure_is_reported() {
    let cluster = seeded_cluster();
    cluster.fail_connect(Some(BackendError::configuration("no server configured")));

    let err = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap_err();
    assert!(matches!(err, OwnershipError::BackendConstruction(_)));

    let err = OwnershipWriter::new(connector(&cluster))
        .claim(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Connection);
    assert_eq!(cluster.patch_calls(), 0);
}

#[tokio::test]
async fn discovery_failure_is_reported() {
    let cluster = seeded_cluster();
    cluster.fail_discovery(Some(BackendError::internal("discovery unavailable")));

    let err = verifier(&cluster)
        .verify(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap_err();
    assert!(matches!(err, OwnershipError::SchemaDiscovery(_)));
    assert_eq!(cluster.get_calls(), 0);
}

#[tokio::test]
async fn handles_are_opened_per_call() {
    let cluster = seeded_cluster();
    let verifier = verifier(&cluster);
    let release = ReleaseManifest::new(MANIFEST, "shop");

    verifier.verify(&release, &id()).await.unwrap();
    let after_first = cluster.connections();
    verifier.verify(&release, &id()).await.unwrap();

    assert_eq!(after_first, 2);
    assert_eq!(cluster.connections(), 4);
}

#[tokio::test]
async fn newly_served_kinds_are_picked_up() {
    let cluster = MemoryCluster::with_builtin_resources();
    let manifest = "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: gizmo\n";
    let release = ReleaseManifest::new(manifest, "shop");
    let verifier = verifier(&cluster);

    assert!(verifier.verify(&release, &id()).await.unwrap().is_unclaimed());
    assert_eq!(cluster.get_calls(), 0);

    cluster.register(ApiResourceList::new(
        "example.com/v1",
        vec![ApiResourceEntry::new("widgets", "Widget", true)],
    ));
    cluster
        .insert(annotated("example.com/v1", "Widget", Some("shop"), "gizmo", "shop:helmrelease/web"))
        .unwrap();

    let status = verifier.verify(&release, &id()).await.unwrap();
    assert!(status.is_owned_by_expected());
    assert!(!status.is_unclaimed());
}

#[tokio::test]
async fn claim_annotates_every_resource() {
    let cluster = seeded_cluster();
    let release = ReleaseManifest::new(MANIFEST, "shop");

    let report = OwnershipWriter::new(connector(&cluster))
        .claim(&release, &id())
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.annotated().count(), 3);
    for (api_version, kind, ns, name) in [
        ("v1", "ConfigMap", "shop", "settings"),
        ("apps/v1", "Deployment", "shop", "web"),
        ("v1", "Service", "edge", "web"),
    ] {
        assert_eq!(
            cluster.annotation(api_version, kind, Some(ns), name, ANTECEDENT_ANNOTATION),
            Some("shop:helmrelease/web".to_string()),
            "{kind}/{name}"
        );
    }

    let status = verifier(&cluster).verify(&release, &id()).await.unwrap();
    assert!(status.is_owned_by_expected());
    assert!(!status.is_unclaimed());
}

#[tokio::test]
async fn claim_overwrites_foreign_owner_and_keeps_other_annotations() {
    let cluster = seeded_cluster();
    let mut settings = annotated("v1", "ConfigMap", Some("shop"), "settings", "other:helmrelease/web");
    settings["metadata"]["annotations"]["team"] = json!("payments");
    settings["data"] = json!({"color": "blue"});
    cluster.insert(settings).unwrap();

    OwnershipWriter::new(connector(&cluster))
        .claim(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    let stored = cluster.object("v1", "ConfigMap", Some("shop"), "settings").unwrap();
    assert_eq!(stored["metadata"]["annotations"][ANTECEDENT_ANNOTATION], "shop:helmrelease/web");
    assert_eq!(stored["metadata"]["annotations"]["team"], "payments");
    assert_eq!(stored["data"]["color"], "blue");
}

#[tokio::test]
async fn claim_is_idempotent() {
    let cluster = seeded_cluster();
    let release = ReleaseManifest::new(MANIFEST, "shop");
    let writer = OwnershipWriter::new(connector(&cluster));

    writer.claim(&release, &id()).await.unwrap();
    let first = cluster.object("apps/v1", "Deployment", Some("shop"), "web");
    writer.claim(&release, &id()).await.unwrap();
    let second = cluster.object("apps/v1", "Deployment", Some("shop"), "web");

    assert_eq!(first, second);
}

#[tokio::test]
async fn claim_continues_past_failures() {
    let cluster = seeded_cluster();
    cluster
        .fail_patches(
            "apps/v1",
            "Deployment",
            Some("shop"),
            "web",
            BackendError::api(403, StatusReason::Forbidden, "patch is forbidden"),
        )
        .unwrap();
    let manifest = format!(
        "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: gizmo\n---\n{MANIFEST}"
    );

    let report = OwnershipWriter::new(connector(&cluster))
        .claim(&ReleaseManifest::new(manifest, "shop"), &id())
        .await
        .unwrap();

    assert!(!report.is_complete());
    let statuses: Vec<_> = report.outcomes().iter().map(|o| &o.status).collect();
    assert!(matches!(statuses[0], ClaimStatus::Unresolved { gvk } if gvk.contains("Widget")));
    assert!(matches!(statuses[1], ClaimStatus::Annotated));
    assert!(matches!(statuses[2], ClaimStatus::PatchFailed(err) if err.reason() == Some(StatusReason::Forbidden)));
    assert!(matches!(statuses[3], ClaimStatus::Annotated));

    assert_eq!(
        cluster.annotation("v1", "Service", Some("edge"), "web", ANTECEDENT_ANNOTATION),
        Some("shop:helmrelease/web".to_string())
    );
    assert_eq!(
        cluster.annotation("apps/v1", "Deployment", Some("shop"), "web", ANTECEDENT_ANNOTATION),
        None
    );
}

#[tokio::test]
async fn claim_reports_missing_objects() {
    let cluster = MemoryCluster::with_builtin_resources();
    cluster.insert(object("v1", "ConfigMap", Some("shop"), "settings")).unwrap();

    let report = OwnershipWriter::new(connector(&cluster))
        .claim(&ReleaseManifest::new(MANIFEST, "shop"), &id())
        .await
        .unwrap();

    assert_eq!(report.annotated().count(), 1);
    assert_eq!(report.failures().count(), 2);
    assert!(report.failures().all(|o| matches!(
        &o.status,
        ClaimStatus::PatchFailed(err) if err.is_not_found()
    )));
    // Patches are never retried.
    assert_eq!(cluster.patch_calls(), 3);
}
