// Argo CD Application request types, the decoded remote resource, and typed manifest views.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

pub const ARGO_GROUP: &str = "argoproj.io";
pub const ARGO_VERSION: &str = "v1alpha1";
pub const ARGO_API_VERSION: &str = "argoproj.io/v1alpha1";
pub const ARGO_API_PATH: &str = "/apis";
pub const APPLICATION_RESOURCE: &str = "applications";
pub const APPLICATION_KIND: &str = "Application";
pub const APPLICATION_FINALIZER: &str = "resources-finalizer.argocd.argoproj.io";
/// Namespace the Argo CD installation (and its Application objects) lives in.
pub const DEVTRON_INSTALLATION_NS: &str = "devtroncd";

/// Fields substituted into the application template.
///
/// Serialized names match the template placeholders, e.g. `{{.ApplicationName}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct AppTemplate {
    /// Name of the Argo CD Application
    pub application_name: String,
    /// Namespace the Application object is created in
    pub namespace: String,
    /// Namespace the application deploys into
    pub target_namespace: String,
    /// API server URL of the destination cluster
    pub target_server: String,
    /// Argo CD project
    pub project: String,
    /// Helm values file, relative to the repo path
    pub values_file: String,
    /// Path of the chart inside the repository
    pub repo_path: String,
    /// Git repository URL
    pub repo_url: String,
    /// Name of the destination cluster
    pub target_name: String,
}

/// Cluster a submission is aimed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterEndpoint {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub server_url: String,
}

/// An Application as returned by the API server, kept as an untyped JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteApplication(JsonMap<String, Value>);

impl RemoteApplication {
    /// Decodes a response body; anything but a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `message` field carried by API error responses.
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// `status.sync.status`, e.g. `Synced` or `OutOfSync`.
    pub fn sync_status(&self) -> Option<&str> {
        self.status_field("sync")
    }

    /// `status.health.status`, e.g. `Healthy` or `Degraded`.
    pub fn health_status(&self) -> Option<&str> {
        self.status_field("health")
    }

    fn status_field(&self, section: &str) -> Option<&str> {
        self.0
            .get("status")?
            .get(section)?
            .get("status")?
            .as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> JsonMap<String, Value> {
        self.0
    }
}

impl From<JsonMap<String, Value>> for RemoteApplication {
    fn from(map: JsonMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Typed Application manifest, both built from an [`AppTemplate`] and parsed for validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationManifest {
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub metadata: Option<ManifestMetadata>,
    pub spec: Option<ApplicationSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: Option<String>,
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub destination: Option<ApplicationDestination>,
    pub project: Option<String>,
    pub source: Option<ApplicationSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDestination {
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    pub path: Option<String>,
    #[serde(rename = "repoURL")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmSource {
    #[serde(default)]
    pub value_files: Vec<String>,
}
