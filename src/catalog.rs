//! Provider catalog: the built-in provider table plus the group filled in by
//! local model discovery.

use crate::model::{ProviderGroup, ProviderOption};

/// Id of the entry shown in the Ollama group while discovery is running.
pub const LOADING_PLACEHOLDER_ID: &str = "loading-ollama";

/// Prefix that marks ids of discovered Ollama models.
pub const OLLAMA_PREFIX: &str = "ollama-";

/// Section heading for discovered models.
pub const OLLAMA_SECTION: &str = "Ollama";

// (section, id, label); order is the order shown in the selector.
const STATIC_PROVIDERS: &[(&str, &str, &str)] = &[
    ("OpenAI", "openai-gpt4", "GPT-4 (OpenAI)"),
    ("OpenAI", "openai-gpt4-turbo", "GPT-4 Turbo (OpenAI)"),
    ("OpenAI", "openai-gpt35-turbo", "GPT-3.5 Turbo (OpenAI)"),
    ("OpenAI", "openai-custom", "Custom OpenAI Model"),
    ("Google Gemini", "gemini-pro", "Gemini Pro"),
    ("Google Gemini", "gemini-pro-vision", "Gemini Pro Vision"),
    ("Google Gemini", "gemini-custom", "Custom Gemini Model"),
    ("Anthropic Claude", "claude-3-opus", "Claude 3 Opus"),
    ("Anthropic Claude", "claude-3-sonnet", "Claude 3 Sonnet"),
    ("Anthropic Claude", "claude-3-haiku", "Claude 3 Haiku"),
    ("Anthropic Claude", "claude-custom", "Custom Claude Model"),
    ("Custom", "custom-api", "Custom API Endpoint"),
    ("Custom", "local-model", "Local Model"),
];

const LOADING_LABEL: &str = "Loading Ollama models...";

/// Human readable label for a provider id.
///
/// Known ids map to their table label, `ollama-<model>` ids become
/// `"<model> (Ollama)"`, anything else is returned unchanged.
pub fn resolve_display_name(id: &str) -> String {
    if id == LOADING_PLACEHOLDER_ID {
        return LOADING_LABEL.to_string();
    }
    if let Some((_, _, label)) = STATIC_PROVIDERS.iter().find(|(_, key, _)| *key == id) {
        return (*label).to_string();
    }
    if let Some(model) = id.strip_prefix(OLLAMA_PREFIX) {
        return format!("{model} (Ollama)");
    }
    id.to_string()
}

/// Entry shown in the dynamic group until discovery finishes.
pub fn loading_placeholder() -> ProviderOption {
    ProviderOption::placeholder(
        LOADING_PLACEHOLDER_ID,
        LOADING_LABEL,
        ProviderGroup::Dynamic,
        OLLAMA_SECTION,
    )
}

#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    static_options: Vec<ProviderOption>,
    dynamic: Vec<ProviderOption>,
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderCatalog {
    pub fn new() -> Self {
        let static_options = STATIC_PROVIDERS
            .iter()
            .map(|(section, id, label)| {
                ProviderOption::selectable(*id, *label, ProviderGroup::Static, section)
            })
            .collect();
        Self {
            static_options,
            dynamic: vec![loading_placeholder()],
        }
    }

    pub fn static_options(&self) -> &[ProviderOption] {
        &self.static_options
    }

    pub fn dynamic_options(&self) -> &[ProviderOption] {
        &self.dynamic
    }

    /// Replace the whole dynamic group.
    pub fn replace_dynamic(&mut self, options: Vec<ProviderOption>) {
        self.dynamic = options;
    }

    /// All options in display order: static sections first, then the dynamic group.
    pub fn options(&self) -> impl Iterator<Item = &ProviderOption> {
        self.static_options.iter().chain(self.dynamic.iter())
    }

    pub fn find(&self, id: &str) -> Option<&ProviderOption> {
        self.options().find(|o| o.id == id)
    }
}
