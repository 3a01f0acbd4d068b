//! Render Argo CD `Application` manifests and submit them to the cluster.
//!
//! [`ArgoApplicationClient`] renders `APPLICATION_TEMPLATE.JSON` for an [`AppTemplate`],
//! creates the resulting object under `/apis/argoproj.io/v1alpha1`, and reads
//! applications back as untyped [`RemoteApplication`] values.

pub mod client;
pub mod error;
pub mod settings;
pub mod template;
pub mod tools;
pub mod types;

pub use client::{ArgoApplicationClient, ClientProvider, InClusterProvider};
pub use error::{Error, Result, TransportError};
pub use settings::Settings;
pub use types::{AppTemplate, ClusterEndpoint, RemoteApplication};
