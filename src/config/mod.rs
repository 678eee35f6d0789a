//! scenario documents: loading and validation

mod schema;

pub use schema::{ElementConfig, EnvironmentConfig, Scenario, Step};

use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::conditions::check_attributes;
use crate::element::{is_valid_tag, ElementRegistry};
use crate::environment::SupportTable;

pub const SCENARIO_ENV_VAR: &str = "SHOW_WHEN_SCENARIO";

/// scenario path from the command line, falling back to the environment
pub fn resolve_path(arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path.to_path_buf());
    }
    match env::var(SCENARIO_ENV_VAR) {
        Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(anyhow!(
            "no scenario file given: pass a path or set {}",
            SCENARIO_ENV_VAR
        )),
    }
}

pub fn load(path: &Path) -> Result<Scenario> {
    if !path.exists() {
        return Err(anyhow!("scenario file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;

    load_from_str(&content)
        .with_context(|| format!("failed to parse scenario file: {}", path.display()))
}

/// parse a JSON or JSON5 scenario document
pub fn load_from_str(content: &str) -> Result<Scenario> {
    let scenario: Scenario = json5::from_str(content).map_err(|e| anyhow!("invalid JSON5: {}", e))?;
    Ok(scenario)
}

/// load a scenario file and list its problems
pub fn verify(path: &Path) -> Result<(Scenario, Vec<String>)> {
    let scenario = load(path)?;
    let problems = validate(&scenario);
    Ok((scenario, problems))
}

/// problems that would make a scenario fail or silently do nothing
pub fn validate(scenario: &Scenario) -> Vec<String> {
    let mut errors = Vec::new();

    // definitions
    let mut registry = ElementRegistry::with_defaults();
    for (tag, flavor) in &scenario.definitions {
        if let Err(e) = registry.define(tag, *flavor) {
            errors.push(format!("definitions.{}: {}", tag, e));
        }
    }

    // environment
    let mut table = SupportTable::new();
    for (i, entry) in scenario.environment.supports.iter().enumerate() {
        if !table.allow(entry) {
            errors.push(format!(
                "environment.supports[{}]: '{}' must look like 'property: value'",
                i, entry
            ));
        }
    }

    // elements
    let mut ids = BTreeSet::new();
    for (i, element) in scenario.elements.iter().enumerate() {
        let prefix = format!("elements[{}]", i);

        if element.id.is_empty() {
            errors.push(format!("{}: 'id' must not be empty", prefix));
        } else if !ids.insert(element.id.as_str()) {
            errors.push(format!("{}: duplicate id '{}'", prefix, element.id));
        }

        let Some(flavor) = registry.lookup(&element.tag) else {
            if is_valid_tag(&element.tag) {
                errors.push(format!("{}: unknown tag '{}'", prefix, element.tag));
            } else {
                errors.push(format!("{}: invalid tag name '{}'", prefix, element.tag));
            }
            continue;
        };

        for problem in check_attributes(&element.attributes, flavor.schema()) {
            errors.push(format!("{}: {}", prefix, problem));
        }
    }

    // steps
    for (i, step) in scenario.steps.iter().enumerate() {
        let prefix = format!("steps[{}] ({})", i, step.action());

        if let Some(id) = step.element() {
            if !ids.contains(id) {
                errors.push(format!("{}: unknown element '{}'", prefix, id));
                continue;
            }
        }

        match step {
            Step::SetAttribute {
                element,
                name,
                value,
            } => {
                let flavor = scenario
                    .elements
                    .iter()
                    .find(|e| &e.id == element)
                    .and_then(|e| registry.lookup(&e.tag));
                if let Some(flavor) = flavor {
                    let attrs: BTreeMap<String, String> = [(name.to_ascii_lowercase(), value.clone())]
                        .into_iter()
                        .collect();
                    for problem in check_attributes(&attrs, flavor.schema()) {
                        errors.push(format!("{}: {}", prefix, problem));
                    }
                }
            }
            Step::AllowSupport { value } if !SupportTable::new().allow(value) => {
                errors.push(format!(
                    "{}: '{}' must look like 'property: value'",
                    prefix, value
                ));
            }
            Step::SetHash { value } if value.contains(char::is_whitespace) => {
                errors.push(format!("{}: hash '{}' contains whitespace", prefix, value));
            }
            _ => {}
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_resolve_path_prefers_argument() {
        let path = resolve_path(Some(Path::new("a.json5"))).unwrap();
        assert_eq!(path, PathBuf::from("a.json5"));
    }

    #[test]
    fn test_load_plain_json() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "scenario.json",
            r#"{"elements": [{"id": "a", "tag": "show-when"}]}"#,
        );
        let scenario = load(&path).unwrap();
        assert_eq!(scenario.elements.len(), 1);
    }

    #[test]
    fn test_verify_valid() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ok.json5",
            r#"{
                environment: { supports: ["display: grid", "gap: *"] },
                elements: [{ id: "a", tag: "show-when", attributes: { "has-network": "offline" } }],
                steps: [
                    { action: "set_online", value: false },
                    { action: "set_attribute", element: "a", name: "has-media", value: "print" },
                ],
            }"#,
        );
        let (scenario, errors) = verify(&path).unwrap();
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(scenario.steps.len(), 2);
    }

    #[test]
    fn test_verify_reports_problems() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "bad.json5",
            r#"{
                environment: { supports: ["grid"] },
                definitions: { "Banner": "show_when", "show-when": "hide_when" },
                elements: [
                    { id: "a", tag: "only-show", attributes: { "when-network": "offline" } },
                    { id: "a", tag: "show-when", attributes: { "has-param": "=x" } },
                    { id: "c", tag: "show-if" },
                ],
                steps: [
                    { action: "connect", element: "missing" },
                    { action: "set_attribute", element: "a", name: "when-network", value: "maybe" },
                ],
            }"#,
        );
        let (_, errors) = verify(&path).unwrap();

        assert!(errors.iter().any(|e| e.starts_with("definitions.Banner")));
        assert!(errors.iter().any(|e| e.contains("already defined")));
        assert!(errors.iter().any(|e| e.starts_with("environment.supports[0]")));
        assert!(errors.iter().any(|e| e.contains("duplicate id 'a'")));
        assert!(errors.iter().any(|e| e.contains("'when-network' is not supported")));
        assert!(errors.iter().any(|e| e.contains("empty parameter name")));
        assert!(errors.iter().any(|e| e.contains("unknown tag 'show-if'")));
        assert!(errors.iter().any(|e| e.contains("unknown element 'missing'")));
        assert!(errors
            .iter()
            .any(|e| e.starts_with("steps[1] (set_attribute)") && e.contains("not supported")));
        assert_eq!(errors.len(), 9);
    }

    #[test]
    fn test_verify_file_not_found() {
        let result = verify(Path::new("/nonexistent/path/scenario.json5"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_verify_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.json5", "{ elements: [ }");
        let result = verify(&path);
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("invalid JSON5"));
    }
}
