use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INPUT_PLACEHOLDER: &str = "${input}";
pub const LANG_PLACEHOLDER: &str = "${lang}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_show_in_menu")]
    pub show_in_menu: bool,
}

fn default_show_in_menu() -> bool {
    true
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            content: content.into(),
            show_in_menu: true,
        }
    }

    /// Fills the placeholders. Templates without `${input}` get the input
    /// appended after a blank line.
    pub fn expand(&self, input: &str, lang: &str) -> String {
        let with_lang = self.content.replace(LANG_PLACEHOLDER, lang);
        if with_lang.contains(INPUT_PLACEHOLDER) {
            with_lang.replace(INPUT_PLACEHOLDER, input)
        } else if input.trim().is_empty() {
            with_lang
        } else {
            format!("{with_lang}\n\n{input}")
        }
    }
}

pub fn default_templates() -> Vec<PromptTemplate> {
    vec![
        PromptTemplate::new(
            "Translate",
            "Translate the following text into ${lang}:\n\n${input}",
        ),
        PromptTemplate::new(
            "Summarize",
            "Summarize the following text in ${lang}:\n\n${input}",
        ),
        PromptTemplate::new("Explain", "Explain this step by step:\n\n${input}"),
        PromptTemplate::new(
            "Proofread",
            "Proofread the text below and list every correction:\n\n${input}",
        ),
        PromptTemplate::new(
            "Compare",
            "Here are answers from several assistants. Compare them and point out disagreements:\n\n${input}",
        ),
    ]
}
