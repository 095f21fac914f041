//! Composers turn collected content into named display fragments.

pub mod builtin;
pub mod template;

use std::collections::HashMap;
use std::fmt;

use crate::collector::{parse_types, ContentMap, ContentType};
use crate::config::ComposerConfig;

/// Fragment name -> rendered text.
pub type Fragments = HashMap<String, String>;

pub type ComposeFn = Box<dyn Fn(&ContentMap) -> String + Send + Sync>;

/// `{content-type}` substitution over declared inputs.
#[derive(Debug, Clone)]
pub struct Template {
    pub inputs: Vec<ContentType>,
    pub source: String,
}

/// Non-empty inputs joined by `separator`, wrapped in `prefix`/`suffix`.
#[derive(Debug, Clone)]
pub struct Join {
    pub inputs: Vec<ContentType>,
    pub separator: String,
    pub prefix: String,
    pub suffix: String,
}

pub struct Custom {
    pub inputs: Vec<ContentType>,
    pub compose: ComposeFn,
}

/// One candidate rendering: usable when every `required` input is non-empty.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub required: Vec<ContentType>,
    pub optional: Vec<ContentType>,
    pub template: String,
}

impl Pattern {
    pub fn new(required: &[ContentType], optional: &[ContentType], template: &str) -> Self {
        Self {
            required: required.to_vec(),
            optional: optional.to_vec(),
            template: template.to_string(),
        }
    }

    fn inputs(&self) -> Vec<ContentType> {
        let mut inputs = self.required.clone();
        inputs.extend(self.optional.iter().copied());
        inputs
    }

    fn matches(&self, content: &ContentMap) -> bool {
        self.required
            .iter()
            .all(|t| content.get(t).is_some_and(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug)]
pub enum Kind {
    Template(Template),
    Join(Join),
    Custom(Custom),
    FirstMatch(Vec<Pattern>),
    PassThrough(Vec<ContentType>),
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").field("inputs", &self.inputs).finish()
    }
}

/// A named fragment producer.
#[derive(Debug)]
pub struct Composer {
    name: String,
    kind: Kind,
}

impl Composer {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn template(name: &str, inputs: &[ContentType], source: &str) -> Self {
        Self::new(
            name,
            Kind::Template(Template {
                inputs: inputs.to_vec(),
                source: source.to_string(),
            }),
        )
    }

    pub fn join(name: &str, inputs: &[ContentType], separator: &str) -> Self {
        Self::new(
            name,
            Kind::Join(Join {
                inputs: inputs.to_vec(),
                separator: separator.to_string(),
                prefix: String::new(),
                suffix: String::new(),
            }),
        )
    }

    pub fn custom<F>(name: &str, inputs: &[ContentType], compose: F) -> Self
    where
        F: Fn(&ContentMap) -> String + Send + Sync + 'static,
    {
        Self::new(
            name,
            Kind::Custom(Custom {
                inputs: inputs.to_vec(),
                compose: Box::new(compose),
            }),
        )
    }

    pub fn first_match(name: &str, patterns: Vec<Pattern>) -> Self {
        Self::new(name, Kind::FirstMatch(patterns))
    }

    pub fn pass_through(name: &str, inputs: &[ContentType]) -> Self {
        Self::new(name, Kind::PassThrough(inputs.to_vec()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content types this composer reads, without duplicates.
    pub fn input_types(&self) -> Vec<ContentType> {
        let all = match &self.kind {
            Kind::Template(t) => t.inputs.clone(),
            Kind::Join(j) => j.inputs.clone(),
            Kind::Custom(c) => c.inputs.clone(),
            Kind::FirstMatch(patterns) => patterns.iter().flat_map(Pattern::inputs).collect(),
            Kind::PassThrough(inputs) => inputs.clone(),
        };
        let mut seen = Vec::with_capacity(all.len());
        for ty in all {
            if !seen.contains(&ty) {
                seen.push(ty);
            }
        }
        seen
    }

    pub fn compose(&self, content: &ContentMap) -> String {
        match &self.kind {
            Kind::Template(t) => template::evaluate(&t.source, &t.inputs, content),
            Kind::Join(j) => {
                let present = template::values(&j.inputs, content);
                if present.is_empty() {
                    return String::new();
                }
                format!("{}{}{}", j.prefix, present.join(&j.separator), j.suffix)
            }
            Kind::Custom(c) => (c.compose)(content),
            Kind::FirstMatch(patterns) => patterns
                .iter()
                .find(|p| p.matches(content))
                .map(|p| template::evaluate(&p.template, &p.inputs(), content))
                .unwrap_or_default(),
            Kind::PassThrough(inputs) => template::values(inputs, content)
                .first()
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Composers by fragment name, in registration order.
#[derive(Debug, Default)]
pub struct ComposerRegistry {
    composers: Vec<Composer>,
}

impl ComposerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a composer, replacing any existing one with the same name in place.
    pub fn register(&mut self, composer: Composer) {
        match self
            .composers
            .iter_mut()
            .find(|c| c.name() == composer.name())
        {
            Some(existing) => *existing = composer,
            None => self.composers.push(composer),
        }
    }

    /// Register composers declared in config.
    pub fn extend_from_config(&mut self, configs: &[ComposerConfig]) {
        for cfg in configs {
            let name = cfg.name.trim();
            if name.is_empty() {
                tracing::warn!("composer without a name ignored");
                continue;
            }
            let inputs = parse_types(&cfg.inputs);
            if let Some(separator) = &cfg.separator {
                if !cfg.template.is_empty() {
                    tracing::warn!("composer '{}': template ignored, separator is set", name);
                }
                self.register(Composer::join(name, &inputs, separator));
                continue;
            }
            if let Err(e) = template::parse(&cfg.template, &inputs) {
                tracing::warn!("composer '{}': {}; inputs will be space-joined", name, e);
            }
            self.register(Composer::template(name, &inputs, &cfg.template));
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Composer> {
        self.composers.iter().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Composer> {
        self.composers.iter()
    }

    pub fn compose_all(&self, content: &ContentMap) -> Fragments {
        self.composers
            .iter()
            .map(|c| (c.name().to_string(), c.compose(content)))
            .collect()
    }
}
