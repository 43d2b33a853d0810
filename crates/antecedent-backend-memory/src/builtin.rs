use antecedent_backend::{ApiResourceEntry, ApiResourceList};

/// A small but representative set of discovery documents.
pub fn builtin_resources() -> Vec<ApiResourceList> {
    vec![
        ApiResourceList::new(
            "v1",
            vec![
                ApiResourceEntry::new("configmaps", "ConfigMap", true),
                ApiResourceEntry::new("secrets", "Secret", true),
                ApiResourceEntry::new("services", "Service", true),
                ApiResourceEntry::new("services/status", "Service", true),
                ApiResourceEntry::new("serviceaccounts", "ServiceAccount", true),
                ApiResourceEntry::new("persistentvolumeclaims", "PersistentVolumeClaim", true),
                ApiResourceEntry::new("namespaces", "Namespace", false),
            ],
        ),
        ApiResourceList::new(
            "apps/v1",
            vec![
                ApiResourceEntry::new("deployments", "Deployment", true),
                ApiResourceEntry::new("deployments/scale", "Scale", true),
                ApiResourceEntry::new("statefulsets", "StatefulSet", true),
                ApiResourceEntry::new("daemonsets", "DaemonSet", true),
            ],
        ),
        ApiResourceList::new(
            "batch/v1",
            vec![
                ApiResourceEntry::new("jobs", "Job", true),
                ApiResourceEntry::new("cronjobs", "CronJob", true),
            ],
        ),
        ApiResourceList::new(
            "rbac.authorization.k8s.io/v1",
            vec![
                ApiResourceEntry::new("roles", "Role", true),
                ApiResourceEntry::new("rolebindings", "RoleBinding", true),
                ApiResourceEntry::new("clusterroles", "ClusterRole", false),
                ApiResourceEntry::new("clusterrolebindings", "ClusterRoleBinding", false),
            ],
        ),
    ]
}
