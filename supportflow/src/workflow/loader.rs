//! Loading workflow documents from disk.

use super::WorkflowDefinition;
use crate::errors::WorkflowLoadError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load a workflow document from disk and validate it.
///
/// `.json` files are parsed as JSON; everything else is parsed as YAML.
///
/// # Errors
///
/// Returns an error when the file cannot be read, parsed or validated.
pub fn load_workflow(path: &Path) -> Result<WorkflowDefinition, WorkflowLoadError> {
    let content = fs::read_to_string(path).map_err(|source| WorkflowLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let workflow = if is_json {
        parse_workflow_json(&content)?
    } else {
        parse_workflow_yaml(&content)?
    };

    info!(
        path = %path.display(),
        workflow = %workflow.name,
        stages = workflow.stage_count(),
        "Loaded workflow"
    );

    Ok(workflow)
}

/// Parse and validate a YAML workflow document.
///
/// # Errors
///
/// Returns an error when YAML parsing or validation fails.
pub fn parse_workflow_yaml(yaml: &str) -> Result<WorkflowDefinition, WorkflowLoadError> {
    let workflow: WorkflowDefinition = serde_yaml::from_str(yaml)?;
    workflow.validate()?;
    Ok(workflow)
}

/// Parse and validate a JSON workflow document.
///
/// # Errors
///
/// Returns an error when JSON parsing or validation fails.
pub fn parse_workflow_json(json: &str) -> Result<WorkflowDefinition, WorkflowLoadError> {
    let workflow: WorkflowDefinition = serde_json::from_str(json)?;
    workflow.validate()?;
    Ok(workflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Backend, StageMode};
    use std::io::Write;

    const SUPPORT_YAML: &str = r#"
name: customer_support
version: 2
stages:
  - name: intake
    mode: deterministic
    abilities:
      - name: accept_payload
        server: COMMON
  - name: clarify
    mode: conditional
    condition: missing_entities
    abilities:
      - name: ask_clarifying_question
        server: ATLAS
  - name: retrieve
    mode: deterministic
    abilities:
      - name: knowledge_base_search
        server: ATLAS
        params:
          top_k: 2
"#;

    #[test]
    fn test_parse_yaml() {
        let workflow = parse_workflow_yaml(SUPPORT_YAML).unwrap();

        assert_eq!(workflow.name, "customer_support");
        assert_eq!(workflow.version, Some(2));
        assert_eq!(workflow.stage_names(), vec!["intake", "clarify", "retrieve"]);
        assert_eq!(workflow.stages[1].mode, StageMode::Conditional);
        assert_eq!(workflow.stages[1].condition.as_deref(), Some("missing_entities"));
        assert_eq!(workflow.stages[2].abilities[0].backend, Backend::Atlas);
    }

    #[test]
    fn test_unknown_mode_is_kept() {
        let yaml = "stages:\n  - name: s\n    mode: parallel\n    abilities: []\n";
        let workflow = parse_workflow_yaml(yaml).unwrap();

        assert_eq!(workflow.name, "workflow");
        assert_eq!(workflow.stages[0].mode, StageMode::Unknown("parallel".to_string()));
    }

    #[test]
    fn test_missing_stages_is_parse_error() {
        let err = parse_workflow_yaml("name: nothing\n").unwrap_err();
        assert!(matches!(err, WorkflowLoadError::Parse(_)));
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let yaml = "stages:\n  - name: s\n    mode: deterministic\n    abilities:\n      - name: a\n        server: REMOTE\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown backend"));
    }

    #[test]
    fn test_stage_without_mode_is_parse_error() {
        let yaml = "stages:\n  - name: s\n    abilities: []\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, WorkflowLoadError::Parse(_)));
        assert!(err.to_string().contains("mode"));
    }

    #[test]
    fn test_stage_without_abilities_is_parse_error() {
        let yaml = "stages:\n  - name: s\n    mode: deterministic\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, WorkflowLoadError::Parse(_)));
        assert!(err.to_string().contains("abilities"));
    }

    #[test]
    fn test_stage_without_mode_in_json_is_parse_error() {
        let json = r#"{"stages": [{"name": "only", "abilities": []}]}"#;
        let err = parse_workflow_json(json).unwrap_err();
        assert!(matches!(err, WorkflowLoadError::Parse(_)));
    }

    #[test]
    fn test_conditional_without_condition_is_invalid() {
        let yaml = "stages:\n  - name: gate\n    mode: conditional\n    abilities: []\n";
        let err = parse_workflow_yaml(yaml).unwrap_err();
        assert!(matches!(err, WorkflowLoadError::Invalid { .. }));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"stages": [{"name": "only", "mode": "deterministic", "abilities": [{"name": "x", "server": "COMMON"}]}]}"#;
        let workflow = parse_workflow_json(json).unwrap();
        assert_eq!(workflow.stage_count(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SUPPORT_YAML.as_bytes()).unwrap();

        let workflow = load_workflow(file.path()).unwrap();
        assert_eq!(workflow.stage_count(), 3);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"name": "j", "stages": []}"#).unwrap();

        let workflow = load_workflow(file.path()).unwrap();
        assert_eq!(workflow.name, "j");
        assert_eq!(workflow.stage_count(), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_workflow(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, WorkflowLoadError::Io { .. }));
    }
}
