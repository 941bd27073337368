//! Instruction templates and the prompt builder.
//!
//! Templates are immutable, versioned records. Rendering substitutes
//! `{name}` placeholders in a single pass, so text that itself contains
//! braces (code, JSON, templates from the page) is inserted verbatim and
//! never re-scanned.

use std::fmt;

use crate::error::{Error, Result};

/// Identifies one of the fixed instruction templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Summarise one chunk in the map phase.
    Map,
    /// Summarise a whole text in one call; also used to combine map outputs.
    Stuff,
    /// Refine a summary against its source.
    SelfReflect,
}

impl TemplateId {
    /// The combine step reuses the stuff template.
    pub const COMBINE: Self = Self::Stuff;

    /// Returns the stable name of this template.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Stuff => "stuff",
            Self::SelfReflect => "self-reflect",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instruction template with its required variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Which template this is.
    pub id: TemplateId,
    /// Bumped whenever the body changes.
    pub version: u32,
    /// Template text with `{name}` placeholders.
    pub body: &'static str,
    /// Variables that must be bound to render.
    pub variables: &'static [&'static str],
}

/// Map template: a bullet-point summary of one chunk.
pub const MAP_TEMPLATE: PromptTemplate = PromptTemplate {
    id: TemplateId::Map,
    version: 1,
    body: "INSTRUCTION:\n\
           - Summarize the following text concisely in bullet point form.\n\
           - Extract the most important, interesting, and relevant content.\n\
           - The text was taken from a website, so there may be redundant website information that should be avoided.\n\
           - Do not state \"The article says\" or \"The text mentions\" or \"The text contains\" or similar statements about the form of the article/text/website in the bullet points.\n\
           TEXT:{text}\n\
           BULLET POINT SUMMARY:",
    variables: &["text"],
};

/// Stuff and combine template: the map instructions plus no repetition.
pub const STUFF_TEMPLATE: PromptTemplate = PromptTemplate {
    id: TemplateId::Stuff,
    version: 1,
    body: "INSTRUCTION:\n\
           - Summarize the following text concisely in bullet point form.\n\
           - Extract the most important, interesting, and relevant content.\n\
           - The text was taken from a website, so there may be redundant website information that should be avoided.\n\
           - Do not state \"The article says\" or \"The text mentions\" or \"The text contains\" or similar statements about the form of the article/text/website in the bullet points.\n\
           - Do not repeat the same information in multiple bullet points.\n\
           TEXT:{text}\n\
           BULLET POINT SUMMARY:",
    variables: &["text"],
};

/// Self-reflect template: keep only what the source states.
pub const SELF_REFLECT_TEMPLATE: PromptTemplate = PromptTemplate {
    id: TemplateId::SelfReflect,
    version: 1,
    body: "INSTRUCTION:\n\
           - Given the original text and a generated summary, refine the summary so that only the correct information is included.\n\
           - Correct information is information that is stated in the original text.\n\
           - If all information in the summary is correct, then do not change the summary.\n\
           - Output should be in bullet point form.\n\
           TEXT:{text}\n\
           SUMMARY:{summary}\n\
           NEW BULLET POINT SUMMARY:",
    variables: &["text", "summary"],
};

/// Returns the template registered for `id`.
#[must_use]
pub const fn template(id: TemplateId) -> &'static PromptTemplate {
    match id {
        TemplateId::Map => &MAP_TEMPLATE,
        TemplateId::Stuff => &STUFF_TEMPLATE,
        TemplateId::SelfReflect => &SELF_REFLECT_TEMPLATE,
    }
}

impl PromptTemplate {
    /// Renders the template with `vars` bound as `(name, value)` pairs.
    ///
    /// Placeholders that name no declared variable are left untouched, as
    /// are unknown bindings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a declared variable is not bound.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String> {
        let lookup = |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

        if let Some(missing) = self.variables.iter().find(|&&v| lookup(v).is_none()) {
            return Err(Error::config(format!(
                "template '{}' v{} requires variable '{missing}'",
                self.id, self.version
            )));
        }

        let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
        let mut out = String::with_capacity(self.body.len() + extra);
        let mut rest = self.body;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after
                .find('}')
                .map(|close| (&after[..close], close))
                .filter(|(name, _)| self.variables.iter().any(|v| v == name))
                .and_then(|(name, close)| lookup(name).map(|value| (value, close)));

            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Renders the template for `id`.
///
/// # Errors
///
/// Returns [`Error::Config`] if a required variable is missing.
///
/// # Examples
///
/// ```
/// use precis::agent::prompt::{TemplateId, render};
///
/// let prompt = render(TemplateId::Map, &[("text", "Rust 1.0 shipped in 2015.")]).unwrap();
/// assert!(prompt.contains("TEXT:Rust 1.0 shipped in 2015."));
/// assert!(render(TemplateId::SelfReflect, &[("text", "x")]).is_err());
/// ```
pub fn render(id: TemplateId, vars: &[(&str, &str)]) -> Result<String> {
    template(id).render(vars)
}

/// Builds the map prompt for one chunk.
///
/// # Errors
///
/// Returns [`Error::Config`] only if the template declares an unbound variable.
pub fn build_map_prompt(chunk: &str) -> Result<String> {
    render(TemplateId::Map, &[("text", chunk)])
}

/// Builds the stuff prompt for a whole text, or the combine prompt for
/// joined map outputs.
///
/// # Errors
///
/// Returns [`Error::Config`] only if the template declares an unbound variable.
pub fn build_stuff_prompt(text: &str) -> Result<String> {
    render(TemplateId::Stuff, &[("text", text)])
}

/// Builds the self-reflect prompt.
///
/// # Errors
///
/// Returns [`Error::Config`] only if the template declares an unbound variable.
pub fn build_reflect_prompt(text: &str, summary: &str) -> Result<String> {
    render(TemplateId::SelfReflect, &[("text", text), ("summary", summary)])
}
