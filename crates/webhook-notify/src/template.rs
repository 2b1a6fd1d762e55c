//! Message template lookup and rendering using Handlebars.
//!
//! Templates are plain files rendered with a context built from the
//! scenario snapshot:
//! - every `scenario_graph` variable at the top level
//! - `scenario`, `scenario_name`, `passed_tasks`, `failed_tasks`,
//!   `overall_status`, `status`
//! - `notification` (`name`, `description`, `notifier`)
//!
//! Built-in keys shadow scenario variables with the same name.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::NotificationSpec;
use crate::error::NotifierError;
use crate::scenario::ScenarioSnapshot;
use crate::settings::NotifierSettings;

/// Renders a template file against a JSON context.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render the template at `path`.
    ///
    /// # Errors
    /// Returns [`NotifierError::Render`] if the file cannot be read or rendered.
    fn render(&self, path: &Path, context: &Value) -> Result<String, NotifierError>;
}

/// [`TemplateRenderer`] backed by Handlebars, with HTML escaping disabled so
/// JSON payload templates come out as written.
pub struct HandlebarsRenderer {
    handlebars: Handlebars<'static>,
}

impl HandlebarsRenderer {
    #[must_use]
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false); // Allow missing variables
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, path: &Path, context: &Value) -> Result<String, NotifierError> {
        let template = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|e| NotifierError::Render {
            template: template.clone(),
            source: Box::new(e),
        })?;

        self.handlebars
            .render_template(&content, context)
            .map_err(|e| NotifierError::Render {
                template,
                source: Box::new(e),
            })
    }
}

/// Finds template files by absolute path or in an ordered list of directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolver {
    search_dirs: Vec<PathBuf>,
}

impl TemplateResolver {
    #[must_use]
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Configured template directories followed by the system temp directory.
    #[must_use]
    pub fn from_settings(settings: &NotifierSettings) -> Self {
        let mut search_dirs = settings.template_dirs.clone();
        search_dirs.push(std::env::temp_dir());
        Self { search_dirs }
    }

    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Locate `template`.
    ///
    /// # Errors
    /// Returns [`NotifierError::TemplateNotFound`] listing every location tried.
    pub fn resolve(&self, template: &Path) -> Result<PathBuf, NotifierError> {
        let candidates: Vec<PathBuf> = if template.is_absolute() {
            vec![template.to_path_buf()]
        } else {
            self.search_dirs.iter().map(|dir| dir.join(template)).collect()
        };

        if let Some(found) = candidates.iter().find(|c| c.is_file()) {
            debug!(template = %found.display(), "Resolved message template");
            return Ok(found.clone());
        }

        Err(NotifierError::TemplateNotFound {
            template: template.display().to_string(),
            searched: candidates,
        })
    }
}

/// Variables available to message templates.
#[must_use]
pub fn template_context(spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> Value {
    let mut context = snapshot.scenario_graph.clone();

    let builtins = json!({
        "scenario": {
            "name": snapshot.name,
            "description": snapshot.description,
            "passed_tasks": snapshot.passed_tasks,
            "failed_tasks": snapshot.failed_tasks,
            "overall_status": snapshot.overall_status,
            "stage": snapshot.stage,
        },
        "scenario_name": snapshot.name,
        "passed_tasks": snapshot.passed_tasks,
        "failed_tasks": snapshot.failed_tasks,
        "overall_status": snapshot.overall_status,
        "status": snapshot.status_label(),
        "notification": {
            "name": spec.name,
            "description": spec.description,
            "notifier": spec.notifier,
        },
    });

    if let Value::Object(builtins) = builtins {
        context.extend(builtins);
    }

    Value::Object(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierKind;

    fn snapshot() -> ScenarioSnapshot {
        let mut snapshot = ScenarioSnapshot::new("test_scenario").with_variable("username", "teflo_user");
        snapshot.passed_tasks = vec!["provision".to_string()];
        snapshot
    }

    #[test]
    fn test_context_contents() {
        let spec = NotificationSpec::new("gchat1", NotifierKind::Gchat);
        let ctx = template_context(&spec, &snapshot());

        assert_eq!(ctx["username"], "teflo_user");
        assert_eq!(ctx["scenario"]["name"], "test_scenario");
        assert_eq!(ctx["scenario_name"], "test_scenario");
        assert_eq!(ctx["passed_tasks"], json!(["provision"]));
        assert_eq!(ctx["overall_status"], 0);
        assert_eq!(ctx["status"], "passed");
        assert_eq!(ctx["notification"]["notifier"], "gchat-notifier");
    }

    #[test]
    fn test_builtins_shadow_scenario_vars() {
        let spec = NotificationSpec::new("n", NotifierKind::Webhook);
        let snap = snapshot().with_variable("status", "custom");
        assert_eq!(template_context(&spec, &snap)["status"], "passed");
    }

    #[test]
    fn test_render_jinja_style_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_temp.jinja");
        std::fs::write(&path, r#"{"text": "hello {{username}} "}"#).unwrap();

        let spec = NotificationSpec::new("gchat1", NotifierKind::Gchat);
        let body = HandlebarsRenderer::new()
            .render(&path, &template_context(&spec, &snapshot()))
            .unwrap();
        assert_eq!(body, r#"{"text": "hello teflo_user "}"#);
    }

    #[test]
    fn test_render_does_not_escape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.hbs");
        std::fs::write(&path, "{{scenario.name}} <{{missing}}>").unwrap();

        let snap = ScenarioSnapshot::new("a&b \"c\"");
        let spec = NotificationSpec::new("n", NotifierKind::Webhook);
        let body = HandlebarsRenderer::new()
            .render(&path, &template_context(&spec, &snap))
            .unwrap();
        assert_eq!(body, "a&b \"c\" <>");
    }

    #[test]
    fn test_render_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.hbs");
        std::fs::write(&path, "{{#if}}").unwrap();

        let err = HandlebarsRenderer::new().render(&path, &json!({})).unwrap_err();
        assert!(matches!(err, NotifierError::Render { .. }));
    }

    #[test]
    fn test_resolve_search_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("t.hbs"), "second").unwrap();

        let resolver = TemplateResolver::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(
            resolver.resolve(Path::new("t.hbs")).unwrap(),
            second.path().join("t.hbs")
        );

        std::fs::write(first.path().join("t.hbs"), "first").unwrap();
        assert_eq!(
            resolver.resolve(Path::new("t.hbs")).unwrap(),
            first.path().join("t.hbs")
        );
    }

    #[test]
    fn test_resolve_absolute_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abs.hbs");
        std::fs::write(&path, "x").unwrap();

        let resolver = TemplateResolver::new(vec![]);
        assert_eq!(resolver.resolve(&path).unwrap(), path);

        let err = resolver.resolve(&dir.path().join("nope.hbs")).unwrap_err();
        match err {
            NotifierError::TemplateNotFound { searched, .. } => assert_eq!(searched.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_settings_appends_temp_dir() {
        let settings = NotifierSettings {
            template_dirs: vec![PathBuf::from("/srv/templates")],
            ..NotifierSettings::default()
        };
        let resolver = TemplateResolver::from_settings(&settings);
        assert_eq!(
            resolver.search_dirs(),
            &[PathBuf::from("/srv/templates"), std::env::temp_dir()]
        );
    }
}
