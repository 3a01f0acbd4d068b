//! Creating and reading Argo CD `Application` objects through the API server.
//!
//! Every call discovers its own client through a [`ClientProvider`]; the default
//! [`InClusterProvider`] builds a fresh in-cluster [`kube::Client`] each time. Pass a
//! prebuilt [`kube::Client`] as the provider to share one client across calls.
use std::time::Duration;

use http::{header, Request};
use http_body_util::BodyExt;
use kube::client::Body;

use crate::{
    error::{Error, Result, TransportError, CREATE_FAILED_MESSAGE},
    settings::Settings,
    template,
    types::{
        AppTemplate, ClusterEndpoint, RemoteApplication, APPLICATION_RESOURCE, ARGO_API_PATH, ARGO_GROUP,
        ARGO_VERSION,
    },
};

/// Supplies a client for the cluster a call is aimed at.
pub trait ClientProvider: Send + Sync {
    fn client_for(&self, cluster: &ClusterEndpoint, timeout: Duration) -> Result<kube::Client>;
}

/// Builds a client from the service account the process runs under.
///
/// The cluster endpoint is not consulted; the in-cluster API server is always used.
#[derive(Debug, Clone, Copy, Default)]
pub struct InClusterProvider;

impl ClientProvider for InClusterProvider {
    fn client_for(&self, cluster: &ClusterEndpoint, timeout: Duration) -> Result<kube::Client> {
        let mut config = kube::Config::incluster().map_err(|err| {
            tracing::error!(error = %err, cluster = %cluster.cluster_name, "error in cluster config");
            Error::TransportConfig(err)
        })?;
        config.connect_timeout = Some(timeout);
        config.read_timeout = Some(timeout);
        config.write_timeout = Some(timeout);
        kube::Client::try_from(config).map_err(Error::ClientBuild)
    }
}

impl ClientProvider for kube::Client {
    fn client_for(&self, _cluster: &ClusterEndpoint, _timeout: Duration) -> Result<kube::Client> {
        Ok(self.clone())
    }
}

/// Rejects names that cannot be a single segment of a request path.
fn check_path_segment(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidRequest(format!("{kind} must not be empty")));
    }
    if value == "." || value == ".." {
        return Err(Error::InvalidRequest(format!("{kind} may not be {value:?}")));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '/' | '%')) {
        return Err(Error::InvalidRequest(format!("{kind} may not contain {c:?}: {value:?}")));
    }
    Ok(())
}

fn applications_path(namespace: &str) -> String {
    format!("{ARGO_API_PATH}/{ARGO_GROUP}/{ARGO_VERSION}/namespaces/{namespace}/{APPLICATION_RESOURCE}")
}

fn application_path(namespace: &str, name: &str) -> String {
    format!("{}/{name}", applications_path(namespace))
}

/// Sends `request` and returns the raw response body.
///
/// Non-success responses become [`TransportError::Status`], which still carries the body.
async fn send_raw(
    client: &kube::Client,
    request: http::Result<Request<Vec<u8>>>,
) -> Result<Vec<u8>, TransportError> {
    let request = request.map_err(TransportError::Build)?;
    let response = client
        .send(request.map(Body::from))
        .await
        .map_err(TransportError::Request)?;
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(TransportError::Request)?
        .to_bytes()
        .to_vec();
    if !status.is_success() {
        return Err(TransportError::Status { status, body });
    }
    Ok(body)
}

/// Turns a failed create into the `message` the server sent back, if any.
fn create_error(err: &TransportError) -> Error {
    let message = match RemoteApplication::from_slice(err.body()) {
        Ok(response) => response.message().unwrap_or(CREATE_FAILED_MESSAGE).to_string(),
        Err(decode) => {
            tracing::error!(error = %decode, transport = %err, "unmarshal error on app create status");
            CREATE_FAILED_MESSAGE.to_string()
        }
    };
    Error::ApplicationCreate { message }
}

/// Client for the `applications.argoproj.io` custom resource.
#[derive(Debug, Clone)]
pub struct ArgoApplicationClient<P = InClusterProvider> {
    provider: P,
    settings: Settings,
}

impl ArgoApplicationClient<InClusterProvider> {
    pub fn in_cluster(settings: Settings) -> Self {
        Self::new(InClusterProvider, settings)
    }
}

impl<P: ClientProvider> ArgoApplicationClient<P> {
    pub fn new(provider: P, settings: Settings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reads the template file and renders it for `request`.
    ///
    /// The file is read on every call so template changes apply without a restart.
    pub async fn render_application(&self, request: &AppTemplate) -> Result<String> {
        let path = &self.settings.template_path;
        let source = tokio::fs::read_to_string(path).await.map_err(|source| {
            tracing::error!(error = %source, path = %path.display(), "err in reading template");
            Error::TemplateSourceUnavailable {
                path: path.clone(),
                source,
            }
        })?;
        template::render(&source, request).map_err(|err| {
            tracing::error!(error = %err, req = ?request, "error in rendering application template");
            err
        })
    }

    /// Renders the application manifest and creates it in `request.namespace`.
    ///
    /// Returns the application name on success. The response body of a successful
    /// create is not inspected.
    pub async fn create_application(&self, request: &AppTemplate, cluster: &ClusterEndpoint) -> Result<String> {
        check_path_segment("namespace", &request.namespace)?;
        let manifest = self.render_application(request).await?;
        let client = self.provider.client_for(cluster, self.settings.request_timeout)?;

        tracing::info!(req = %manifest, "creating application");
        let post = Request::post(applications_path(&request.namespace))
            .header(header::CONTENT_TYPE, "application/json")
            .body(manifest.into_bytes());
        match send_raw(&client, post).await {
            Ok(res) => {
                tracing::info!(res = %String::from_utf8_lossy(&res), "argo app create res");
            }
            Err(err) => {
                let err = create_error(&err);
                tracing::error!(error = %err, "error in creating acd application");
                return Err(err);
            }
        }
        tracing::info!(name = %request.application_name, "argo application created successfully");
        Ok(request.application_name.clone())
    }

    /// Fetches the application `app_name` from `namespace`.
    ///
    /// Unless [`Settings::decode_get_response`] is set, a successful response yields an
    /// empty resource. A failed response whose body is a JSON object is returned as
    /// [`Error::ApplicationGet`], which keeps both the decoded body and the failure.
    pub async fn get_application(
        &self,
        namespace: &str,
        app_name: &str,
        cluster: &ClusterEndpoint,
    ) -> Result<RemoteApplication> {
        check_path_segment("namespace", namespace)?;
        check_path_segment("application name", app_name)?;
        let client = self.provider.client_for(cluster, self.settings.request_timeout)?;
        tracing::info!(req = %app_name, "get argo cd application");

        let request = Request::get(application_path(namespace, app_name)).body(Vec::new());
        match send_raw(&client, request).await {
            Ok(body) => {
                let resource = if self.settings.decode_get_response {
                    RemoteApplication::from_slice(&body).map_err(|err| {
                        tracing::error!(error = %err, "unmarshal error on app get response");
                        Error::ApplicationRead
                    })?
                } else {
                    RemoteApplication::default()
                };
                tracing::info!(res = ?resource, "get argo cd application");
                Ok(resource)
            }
            Err(source) => {
                let resource = RemoteApplication::from_slice(source.body()).map_err(|err| {
                    tracing::error!(error = %err, transport = %source, "unmarshal error on app get status");
                    Error::ApplicationRead
                })?;
                tracing::info!(res = ?resource, err = %source, "get argo cd application");
                Err(Error::ApplicationGet { resource, source })
            }
        }
    }
}
