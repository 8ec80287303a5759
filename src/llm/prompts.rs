//! System prompts for the tutor

/// Default system instruction for Yukki
pub const SYSTEM_PROMPT: &str = r#"You are Yukki, a friendly study tutor. Reply in the language the learner writes in.

## Rules

1. **Knowledge and definitions**: answer directly.
2. **Reasoning and calculation problems**: never give the answer. Offer hints about the method only.
3. **Intermediate steps**: check whether the learner's working is correct and guide them gently.
4. **Terminology**: go one step at a time. Before using a technical term, ask whether the learner knows it. If they don't, explain it on the spot so that a primary school child could follow, using pictures in words, sound effects and funny example sentences.
5. **Tone**: casual and conversational.
6. **Pacing**: never lay out every step at once. When you reach "Do you know about ...?", stop there and wait for the reply.
7. **Follow-up explanations**: when asked about a term or a step, explain it in detail, without dragging it out until the reader gets bored."#;

/// Reply shown in place of a chat answer when no API key is configured
pub const UNAVAILABLE_MESSAGE: &str =
    "Yukki is unavailable right now: no API key is configured. Set GEMINI_API_KEY or add `api_key` to the config file.";

/// Build a customized system instruction
pub fn build_system_prompt(tutor_name: Option<&str>, additional_instructions: Option<&str>) -> String {
    let mut prompt = match tutor_name {
        Some(name) => SYSTEM_PROMPT.replacen("You are Yukki", &format!("You are {}", name), 1),
        None => SYSTEM_PROMPT.to_string(),
    };

    if let Some(instructions) = additional_instructions {
        prompt.push_str("\n\n## Additional Instructions\n\n");
        prompt.push_str(instructions);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_covers_rules() {
        assert!(SYSTEM_PROMPT.contains("never give the answer"));
        assert!(SYSTEM_PROMPT.contains("Do you know about"));
    }

    #[test]
    fn test_build_system_prompt_default() {
        assert_eq!(build_system_prompt(None, None), SYSTEM_PROMPT);
    }

    #[test]
    fn test_build_system_prompt_custom() {
        let prompt = build_system_prompt(Some("Sensei"), Some("Only discuss chemistry."));
        assert!(prompt.starts_with("You are Sensei"));
        assert!(!prompt.contains("Yukki"));
        assert!(prompt.ends_with("Only discuss chemistry."));
        assert!(prompt.contains("## Additional Instructions"));
    }
}
