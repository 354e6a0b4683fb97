//! Evaluation request: merges resume text and job description into the
//! fixed ATS prompt.

use crate::evaluation::prompts::{
    ATS_EVALUATION_PROMPT_V1, JOB_DESCRIPTION_PLACEHOLDER, RESUME_PLACEHOLDER,
};

/// Everything sent to the evaluation service for one resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub resume_text: String,
    pub job_description: String,
    /// The rendered prompt. Inputs are embedded verbatim, without escaping.
    pub prompt: String,
}

/// Builds the evaluation request. Pure string interpolation, no truncation.
pub fn build(resume_text: &str, job_description: &str) -> EvaluationRequest {
    let prompt = fill_template(
        ATS_EVALUATION_PROMPT_V1,
        &[
            (RESUME_PLACEHOLDER, resume_text),
            (JOB_DESCRIPTION_PLACEHOLDER, job_description),
        ],
    );

    EvaluationRequest {
        resume_text: resume_text.to_string(),
        job_description: job_description.to_string(),
        prompt,
    }
}

/// Single-pass placeholder substitution. Substituted values are never
/// rescanned, so a resume containing `{job_description}` stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
            .min_by_key(|(at, _, _)| *at);

        match next {
            Some((at, key, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::prompts::RESPONSE_SCHEMA;

    #[test]
    fn test_prompt_contains_response_schema() {
        let request = build("resume", "jd");
        assert!(request.prompt.contains(RESPONSE_SCHEMA));
        assert!(request
            .prompt
            .contains(r#"{"JD Match": "<percent>%", "MissingKeywords": ["#));
    }

    #[test]
    fn test_prompt_sets_ats_role() {
        let request = build("resume", "jd");
        assert!(request
            .prompt
            .contains("act like a skilled ATS (Applicant Tracking System)"));
    }

    #[test]
    fn test_inputs_are_embedded_verbatim() {
        let request = build("Rust engineer, 5 years", "Senior Go developer");
        assert!(request.prompt.contains("Resume: Rust engineer, 5 years\n"));
        assert!(request.prompt.contains("Job Description: Senior Go developer\n"));
        assert!(!request.prompt.contains(RESUME_PLACEHOLDER));
        assert!(!request.prompt.contains(JOB_DESCRIPTION_PLACEHOLDER));
        assert_eq!(request.resume_text, "Rust engineer, 5 years");
        assert_eq!(request.job_description, "Senior Go developer");
    }

    #[test]
    fn test_quotes_and_braces_are_not_escaped() {
        let request = build(r#"Led "Project {X}""#, "jd");
        assert!(request.prompt.contains(r#"Resume: Led "Project {X}""#));
    }

    #[test]
    fn test_placeholder_in_resume_is_not_reexpanded() {
        let request = build("see {job_description}", "Kubernetes");
        assert!(request.prompt.contains("Resume: see {job_description}\n"));
        assert_eq!(request.prompt.matches("Kubernetes").count(), 1);
    }

    #[test]
    fn test_resume_resembling_schema_is_passed_through() {
        let request = build(RESPONSE_SCHEMA, "jd");
        assert_eq!(request.prompt.matches(RESPONSE_SCHEMA).count(), 2);
    }

    #[test]
    fn test_fill_template_without_placeholders() {
        assert_eq!(fill_template("plain", &[("{a}", "x")]), "plain");
    }

    #[test]
    fn test_long_input_is_not_truncated() {
        let resume = "x".repeat(100_000);
        let request = build(&resume, "jd");
        assert!(request.prompt.contains(&resume));
    }
}
