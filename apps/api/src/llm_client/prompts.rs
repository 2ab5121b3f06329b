// Shared prompt fragments. Each inference operation builds its own prompt in
// inference/prompts.rs and appends these where they apply.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that rewrites or advises on résumé content.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Do NOT invent, create, or fabricate skills, experiences, projects, or \
    qualifications that are not already present in the candidate's résumé. \
    Rephrase, reorder, and emphasize existing content only.";

/// Builds a role-specific system prompt that ends with the JSON-only contract.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_contract() {
        let system = json_system("You are an expert resume parser.");
        assert!(system.starts_with("You are an expert resume parser."));
        assert!(system.ends_with(JSON_ONLY_SYSTEM));
    }
}
