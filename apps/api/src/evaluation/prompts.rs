// Prompt constants for resume evaluation.
//
// The evaluation template is a contract with the external service: the
// response parser expects exactly the keys named in its response format.
// Changing the wording is a behavior change; bump the version suffix.

/// Response schema the evaluator is instructed to return.
pub const RESPONSE_SCHEMA: &str =
    r#"{"JD Match": "<percent>%", "MissingKeywords": [<string>, ...], "Profile Summary": "<string>"}"#;

/// ATS evaluation prompt, version 1.
/// Replace `{resume_text}` and `{job_description}` before sending.
pub const ATS_EVALUATION_PROMPT_V1: &str = r#"Hey, act like a skilled ATS (Applicant Tracking System) with expertise in software engineering, data science, and big data. Evaluate the resume against the given job description in a competitive job market. Identify the keywords from the job description that are missing from the resume, estimate the percentage match, and write a short profile summary of the candidate.

Resume: {resume_text}
Job Description: {job_description}

Respond ONLY with a single JSON object in exactly this format, with no other text:
{"JD Match": "<percent>%", "MissingKeywords": [<string>, ...], "Profile Summary": "<string>"}"#;

pub const RESUME_PLACEHOLDER: &str = "{resume_text}";
pub const JOB_DESCRIPTION_PLACEHOLDER: &str = "{job_description}";
