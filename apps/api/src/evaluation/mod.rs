// Resume evaluation: prompt construction, the service call, response
// validation and the HTTP handler that ties them to an upload.
// All service calls go through llm_client; nothing here talks to Gemini directly.

pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod request;
