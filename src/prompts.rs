use crate::models::Language;

pub const CREATE_NOVEL_ENG: &str = include_str!("../data/prompts/create_novel_eng.txt");
pub const CREATE_NOVEL_UA: &str = include_str!("../data/prompts/create_novel_ua.txt");
pub const IMAGE_PROMPT: &str = include_str!("../data/prompts/image_prompt.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Story-opening prompt for the requested language.
pub fn create_novel(language: Language) -> &'static str {
    match language {
        Language::English => CREATE_NOVEL_ENG,
        Language::Ukrainian => CREATE_NOVEL_UA,
    }
}

/// Image-model prompt for an illustration description.
pub fn image_prompt(illustration: &str) -> String {
    render(IMAGE_PROMPT, &[("illustration", illustration)])
}
