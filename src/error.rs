use thiserror::Error;

/// Startup problems. These block a session from being created at all.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please set {var} in your environment or .env file")]
    MissingCredential { var: &'static str },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("failed to reach completion service at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("completion service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not parse completion response: {0}")]
    InvalidResponse(String),

    #[error("completion service returned no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Web search unavailable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Web search unavailable: invalid search endpoint {0}")]
    InvalidEndpoint(String),
}

/// Rejections raised before any external call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanningError {
    #[error("Please enter a goal to create a plan.")]
    EmptyGoal,
}
