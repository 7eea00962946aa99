//! Prompt template loading.
//!
//! Templates are addressed by a `(path, name)` pair, mirroring a
//! hierarchical `prompts/` directory (e.g. `"agents/writer"`,
//! `"introduction"`), and use `{variable}` substitution against a set of
//! caller-supplied values. Required variables are declared per template; a
//! missing one is a [`PromptError::MissingVariable`], not a silent blank.

use std::collections::HashMap;
use thiserror::Error;

/// Errors from prompt template loading and substitution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PromptError {
    /// No template registered at this path/name.
    #[error("prompt not found: {path}/{name}")]
    NotFound {
        /// Template path, e.g. `"agents/writer"`.
        path: String,
        /// Template name within that path, e.g. `"introduction"`.
        name: String,
    },

    /// A variable the template declares as required was not supplied.
    #[error("missing required variable '{0}' for prompt")]
    MissingVariable(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A single template: its `{var}`-substitution body and the variable names
/// it requires.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Template body, using `{name}` placeholders.
    pub template: String,
    /// Variable names that must be present in the substitution map.
    pub required_variables: Vec<String>,
}

impl PromptTemplate {
    /// Construct a template with no required variables.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            required_variables: Vec::new(),
        }
    }

    /// Declare the variables this template requires.
    pub fn with_required(mut self, vars: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_variables = vars.into_iter().map(Into::into).collect();
        self
    }
}

/// Loads and fills prompt templates.
///
/// Implementations may back this with a static in-memory map (as
/// [`StaticPromptLoader`] does), a filesystem directory, or a remote
/// template store — the core only depends on this trait.
pub trait PromptLoader: Send + Sync {
    /// Fetch the named prompt at `path` and substitute `variables` into it.
    fn get_prompt(
        &self,
        path: &str,
        name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String, PromptError>;

    /// List the prompt names registered at `path`.
    fn list_prompts(&self, path: &str) -> Vec<String>;
}

/// A [`PromptLoader`] backed by an in-memory map of `(path, name) ->
/// template`, populated at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticPromptLoader {
    templates: HashMap<(String, String), PromptTemplate>,
}

impl StaticPromptLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Register a template at `path`/`name`.
    pub fn register(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        template: PromptTemplate,
    ) -> Self {
        self.templates.insert((path.into(), name.into()), template);
        self
    }
}

impl PromptLoader for StaticPromptLoader {
    fn get_prompt(
        &self,
        path: &str,
        name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String, PromptError> {
        let key = (path.to_string(), name.to_string());
        let tmpl = self.templates.get(&key).ok_or_else(|| PromptError::NotFound {
            path: path.to_string(),
            name: name.to_string(),
        })?;

        for required in &tmpl.required_variables {
            if !variables.contains_key(required) {
                return Err(PromptError::MissingVariable(required.clone()));
            }
        }

        Ok(substitute(&tmpl.template, variables))
    }

    fn list_prompts(&self, path: &str) -> Vec<String> {
        self.templates
            .keys()
            .filter(|(p, _)| p == path)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// Replace every `{name}` occurrence in `template` with its value from
/// `variables`. Unknown placeholders are left untouched.
fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut placeholder = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            placeholder.push(inner);
        }
        if closed {
            match variables.get(&placeholder) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(&placeholder);
                    out.push('}');
                }
            }
        } else {
            out.push('{');
            out.push_str(&placeholder);
        }
    }

    out
}
