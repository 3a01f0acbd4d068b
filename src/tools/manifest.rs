// Build and validate Argo CD Application manifests.

use crate::types::{
    AppTemplate, ApplicationDestination, ApplicationManifest, ApplicationSource, ApplicationSpec, HelmSource,
    ManifestMetadata, APPLICATION_FINALIZER, APPLICATION_KIND, ARGO_API_VERSION,
};
use serde_json::json;

/// Builds the Application manifest for `request` without going through the template file.
/// Produces the same document as the shipped APPLICATION_TEMPLATE.JSON.
pub fn build_application_manifest(request: &AppTemplate) -> ApplicationManifest {
    let value_files = if request.values_file.is_empty() {
        Vec::new()
    } else {
        vec![request.values_file.clone()]
    };
    ApplicationManifest {
        api_version: Some(ARGO_API_VERSION.to_string()),
        kind: Some(APPLICATION_KIND.to_string()),
        metadata: Some(ManifestMetadata {
            name: Some(request.application_name.clone()),
            namespace: Some(request.namespace.clone()),
            finalizers: vec![APPLICATION_FINALIZER.to_string()],
        }),
        spec: Some(ApplicationSpec {
            destination: Some(ApplicationDestination {
                namespace: Some(request.target_namespace.clone()),
                server: Some(request.target_server.clone()),
                name: None,
            }),
            project: Some(request.project.clone()),
            source: Some(ApplicationSource {
                path: Some(request.repo_path.clone()),
                repo_url: Some(request.repo_url.clone()),
                helm: Some(HelmSource { value_files }),
            }),
            sync_policy: Some(json!({ "automated": { "prune": true } })),
        }),
    }
}

/// Generates an Application YAML manifest for the given request.
pub fn generate_application_manifest(request: &AppTemplate, description: Option<&str>) -> Result<String, String> {
    if request.application_name.is_empty() {
        return Err("ApplicationName is required".to_string());
    }
    let manifest = build_application_manifest(request);
    let yaml = serde_yaml::to_string(&manifest).map_err(|e| e.to_string())?;
    let mut out = "# Generated Argo CD Application manifest\n".to_string();
    if let Some(d) = description {
        out.push_str(&format!("# Description: {}\n", d));
    }
    out.push_str(&yaml);
    Ok(out)
}

/// Validates an Application manifest given as YAML or JSON: apiVersion/kind, metadata.name,
/// spec.destination and spec.source.repoURL.
pub fn validate_application_manifest(manifest: &str) -> Result<(), Vec<String>> {
    let parsed: ApplicationManifest =
        serde_yaml::from_str(manifest).map_err(|e| vec![format!("parse error: {}", e)])?;

    let mut errors = Vec::new();

    if parsed.api_version.as_deref() != Some(ARGO_API_VERSION) {
        errors.push(format!("apiVersion must be '{}'", ARGO_API_VERSION));
    }
    if parsed.kind.as_deref() != Some(APPLICATION_KIND) {
        errors.push(format!("kind must be '{}'", APPLICATION_KIND));
    }
    let name = parsed.metadata.as_ref().and_then(|m| m.name.as_deref());
    if name.map_or(true, str::is_empty) {
        errors.push("metadata.name is required".to_string());
    }
    let spec = match &parsed.spec {
        Some(s) => s,
        None => {
            errors.push("spec is required".to_string());
            return Err(errors);
        }
    };

    match &spec.destination {
        Some(d) => {
            let has_server = d.server.as_deref().is_some_and(|s| !s.is_empty());
            let has_name = d.name.as_deref().is_some_and(|s| !s.is_empty());
            if !has_server && !has_name {
                errors.push("spec.destination.server or spec.destination.name is required".to_string());
            }
        }
        None => errors.push("spec.destination is required".to_string()),
    }

    match &spec.source {
        Some(s) => {
            if s.repo_url.as_deref().map_or(true, str::is_empty) {
                errors.push("spec.source.repoURL is required".to_string());
            }
        }
        None => errors.push("spec.source is required".to_string()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;

    fn request() -> AppTemplate {
        AppTemplate {
            application_name: "app1".into(),
            namespace: "devtroncd".into(),
            target_namespace: "default".into(),
            target_server: "https://kubernetes.default.svc".into(),
            project: "default".into(),
            values_file: "_1-values.yaml".into(),
            repo_path: "reference-chart_4-11-0/4.11.0".into(),
            repo_url: "https://github.com/org/gitops-app1.git".into(),
            target_name: "default_cluster".into(),
        }
    }

    #[test]
    fn test_builder_matches_shipped_template() {
        let source = include_str!("../../scripts/argo-assets/APPLICATION_TEMPLATE.JSON");
        let rendered = template::render(source, &request()).unwrap();
        let from_template: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let built = serde_json::to_value(build_application_manifest(&request())).unwrap();
        assert_eq!(from_template, built);
    }

    #[test]
    fn test_shipped_template_validates() {
        let source = include_str!("../../scripts/argo-assets/APPLICATION_TEMPLATE.JSON");
        let rendered = template::render(source, &request()).unwrap();
        assert!(validate_application_manifest(&rendered).is_ok());
    }

    #[test]
    fn test_generate_application_manifest() {
        let yaml = generate_application_manifest(&request(), Some("app1 on default")).unwrap();
        assert!(yaml.starts_with("# Generated Argo CD Application manifest\n# Description: app1 on default\n"));
        assert!(yaml.contains("apiVersion: argoproj.io/v1alpha1"));
        assert!(yaml.contains("kind: Application"));
        assert!(yaml.contains("name: app1"));
        assert!(yaml.contains("repoURL:"));
        assert!(yaml.contains("github.com/org/gitops-app1.git"));
        assert!(yaml.contains("valueFiles:"));
        assert!(validate_application_manifest(&yaml).is_ok());
    }

    #[test]
    fn test_generate_application_manifest_requires_name() {
        let req = AppTemplate {
            application_name: String::new(),
            ..request()
        };
        let err = generate_application_manifest(&req, None).unwrap_err();
        assert!(err.contains("ApplicationName"));
    }

    #[test]
    fn test_validate_application_manifest_wrong_kind() {
        let yaml = r#"
apiVersion: argoproj.io/v1alpha1
kind: AppProject
metadata:
  name: test
spec:
  destination:
    server: https://kubernetes.default.svc
  source:
    repoURL: https://github.com/org/repo.git
"#;
        let err = validate_application_manifest(yaml).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].contains("kind"));
    }

    #[test]
    fn test_validate_application_manifest_missing_spec() {
        let yaml = r#"
apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: test
"#;
        let err = validate_application_manifest(yaml).unwrap_err();
        assert_eq!(err, vec!["spec is required".to_string()]);
    }

    #[test]
    fn test_validate_application_manifest_missing_destination_and_repo() {
        let json = r#"{"apiVersion": "argoproj.io/v1alpha1", "kind": "Application",
            "metadata": {"name": "test"}, "spec": {"destination": {"namespace": "default"}, "source": {"path": "charts"}}}"#;
        let err = validate_application_manifest(json).unwrap_err();
        assert!(err.iter().any(|e| e.contains("spec.destination.server")));
        assert!(err.iter().any(|e| e.contains("spec.source.repoURL")));
    }

    #[test]
    fn test_validate_application_manifest_parse_error() {
        let err = validate_application_manifest("{ not: [valid").unwrap_err();
        assert!(err[0].starts_with("parse error"));
    }
}
