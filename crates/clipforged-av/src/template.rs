//! Placeholder substitution for batch argument templates.

use std::collections::HashMap;
use std::path::Path;

use crate::{Error, Result};

/// Variables available to a template, substituted with `{name}` syntax.
///
/// ```
/// use clipforged_av::TemplateContext;
/// use std::path::Path;
///
/// let ctx = TemplateContext::for_input(Path::new("clips/intro.mov"));
/// assert_eq!(ctx.substitute("{filestem}_small.mp4"), "intro_small.mp4");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables describing one input file: `{input}`, `{filename}`,
    /// `{filestem}` and `{extension}`. Missing components become empty.
    pub fn for_input(input: &Path) -> Self {
        let lossy = |s: Option<&std::ffi::OsStr>| {
            s.map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
        };

        Self::new()
            .with_var("input", &input.display().to_string())
            .with_var("filename", &lossy(input.file_name()))
            .with_var("filestem", &lossy(input.file_stem()))
            .with_var("extension", &lossy(input.extension()))
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Replace every known `{name}` in `template` in a single pass.
    ///
    /// Substituted values are not scanned again, and unknown placeholders are
    /// kept verbatim.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}').map(|close| (&after[..close], close)) {
                Some((name, close)) if self.vars.contains_key(name) => {
                    out.push_str(&self.vars[name]);
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }

    pub fn substitute_all(&self, templates: &[String]) -> Vec<String> {
        templates.iter().map(|t| self.substitute(t)).collect()
    }
}

/// One rendered batch invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub args: Vec<String>,
    /// Value substituted for `{output}`, if the template names an output.
    pub output: Option<String>,
}

/// An argument vector run once per input file.
///
/// The optional output pattern is rendered first and made available to the
/// arguments as `{output}`.
#[derive(Debug, Clone)]
pub struct BatchTemplate {
    args: Vec<String>,
    output: Option<String>,
}

impl BatchTemplate {
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `args` is empty, or if it refers to
    /// `{output}` while `output` is `None`.
    pub fn new(args: Vec<String>, output: Option<String>) -> Result<Self> {
        if args.is_empty() {
            return Err(Error::validation("batch template has no arguments"));
        }
        if output.is_none() && args.iter().any(|a| a.contains("{output}")) {
            return Err(Error::validation(
                "batch template uses {output} but no output pattern was given",
            ));
        }
        Ok(Self { args, output })
    }

    pub fn render(&self, input: &Path) -> BatchItem {
        let mut ctx = TemplateContext::for_input(input);
        let output = self.output.as_deref().map(|pattern| ctx.substitute(pattern));
        if let Some(ref output) = output {
            ctx.set("output", output);
        }

        BatchItem {
            args: ctx.substitute_all(&self.args),
            output,
        }
    }
}
