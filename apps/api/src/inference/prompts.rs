// Prompt templates for the inference operations.
// Placeholders are `{name}` and are filled in one pass by `fill`.

pub const PARSE_ROLE: &str = "You are an expert resume parser and ATS compatibility reviewer.";

/// Replace: {resume_text}
pub const PARSE_PROMPT_TEMPLATE: &str = r#"Extract the following information from the resume content below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "skills": ["Python", "Docker"],
  "experience_summary": "Summary of the work experience.",
  "education_summary": "Summary of the education history.",
  "formatting_issues": "Potential ATS blockers: formatting problems, unusual characters, missing keywords."
}

RESUME CONTENT:
{resume_text}"#;

pub const MATCH_ROLE: &str = "You are an AI expert in recruiting and talent acquisition.";

/// Replace: {job_description}, {resume_text}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"You will receive a job description and a resume.

Your tasks are to:
1. Provide a match score (0-100) indicating how well the resume fits the job description. A higher score indicates a better match.
2. Summarize the skills and experiences in the resume that align with the requirements of the job description.
3. List the key skills mentioned in the job description that are missing from the resume. Return an empty list if nothing is missing.

Return a JSON object with this EXACT schema:
{
  "score": 72,
  "relevance_narrative": "Summary of relevant skills and experience.",
  "missing_skills": ["Kubernetes"]
}

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_text}"#;

pub const SKILL_GAP_ROLE: &str = "You are an expert career coach and learning strategist.";

/// Replace: {job_description}, {resume_text}, {missing_skills}
pub const SKILL_GAP_PROMPT_TEMPLATE: &str = r#"Analyze the skill gap between the resume and the job description and create a learning roadmap.

For each missing skill:
1. Rank by importance: the most critical skill for the role comes first in the output array.
2. Explain briefly why the skill matters for this specific job.
3. Pick the learning level to start at: "Beginner", "Intermediate" or "Advanced".
4. Provide 2-3 actionable learning steps, each with a simple practice idea or mini-project. Do not suggest paid courses or external platforms.

Return a JSON object with this EXACT schema:
{
  "per_skill": [
    {
      "skill": "Kubernetes",
      "importance": "Why the skill matters for this role.",
      "learning_level": "Beginner",
      "learning_steps": [
        {"step": "A concrete step.", "practice_ideas": "A practice idea for this step."}
      ]
    }
  ]
}

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_text}

MISSING SKILLS:
{missing_skills}"#;

pub const SUGGEST_ROLE: &str = "You are an expert resume writer.";

/// Replace: {no_fabrication}, {job_description}, {resume_text}
pub const SUGGEST_PROMPT_TEMPLATE: &str = r#"{no_fabrication}

Suggest how to improve the resume below for the job description: rewrite bullet points and insert relevant keywords from the job description where the candidate's experience supports them.

Return a JSON object with this EXACT schema:
{
  "suggestion_text": "Markdown-formatted suggestions."
}

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}"#;

pub const ALIGN_ROLE: &str = "You are an expert resume writer optimizing a resume for a specific job description.";

/// Replace: {no_fabrication}, {original_resume}, {job_description}, {missing_skills},
///          {relevance_narrative}, {mode}, {mode_guidance}
pub const ALIGN_PROMPT_TEMPLATE: &str = r#"{no_fabrication}

Every part of the generated resume must be traceable to the original resume.
The output must be plain text with standard section headings (Experience, Skills, Education).

ORIGINAL RESUME:
{original_resume}

TARGET JOB DESCRIPTION:
{job_description}

MISSING KEYWORDS:
{missing_skills}

RELEVANT HIGHLIGHTS:
{relevance_narrative}

OPTIMIZATION MODE: {mode}
{mode_guidance}

Rewrite the resume according to the mode, integrating missing keywords only where they authentically fit. Then summarize the key changes you made.

Return a JSON object with this EXACT schema:
{
  "generated_text": "The full rewritten resume.",
  "improvement_summary": "A brief summary of the changes."
}"#;

pub const FRESH_ROLE: &str =
    "You are an expert resume writer creating a professional, ATS-friendly resume from scratch.";

/// Replace: {no_fabrication}, {job_description}, {full_name}, {target_role}, {skills},
///          {education}, {experience}, {projects}, {certifications}
pub const FRESH_PROMPT_TEMPLATE: &str = r#"{no_fabrication}

Build the resume only from the career information below, aligned to the target job description.
Every part of the resume must be traceable to this information.
The output must be plain text with standard section headings (Summary, Skills, Experience, Projects, Education). Omit sections the candidate has nothing for.

TARGET JOB DESCRIPTION:
{job_description}

CAREER INFORMATION:
Full name: {full_name}
Target role: {target_role}
Skills: {skills}
Education: {education}
Experience / internships: {experience}
Projects: {projects}
Certifications: {certifications}

Open with a 2-3 sentence summary positioning the candidate for the target role. Rephrase the raw input into professional bullet points, using the job description's language where the input supports it. Then explain briefly how you constructed the resume.

Return a JSON object with this EXACT schema:
{
  "generated_text": "The full resume.",
  "improvement_summary": "How the resume was constructed."
}"#;

pub const INSIGHTS_ROLE: &str =
    "You are an expert career advisor analyzing why a resume did or did not perform well.";

/// Replace: {resume_version}, {job_description}, {outcome}
pub const INSIGHTS_PROMPT_TEMPLATE: &str = r#"Based on the resume, the job description and the application outcome, identify patterns in keyword alignment, skill relevance and formatting.

RESUME VERSION:
{resume_version}

JOB DESCRIPTION:
{job_description}

APPLICATION OUTCOME: {outcome}

In simple, non-technical language, list what likely worked, what likely did not, and concrete recommendations for future applications. If the outcome is not "offer" or "rejected", give general observations only.

Return a JSON object with this EXACT schema:
{
  "positive_factors": ["What worked."],
  "negative_factors": ["What did not work."],
  "recommendations": ["What to change next time."]
}"#;

/// Substitutes `{name}` placeholders of `template` from `values`. Only the template is
/// scanned, so placeholder-like text inside a value is left as written. Unknown
/// placeholders (and JSON braces) pass through untouched.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
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
    out
}

/// Renders a skill list as one bullet per line for prompt insertion.
pub fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
