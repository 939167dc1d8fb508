use thiserror::Error;

const BODY_LOG_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("executor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("executor response is not JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ExecutorError {
    pub fn status(status: u16, body: String) -> Self {
        Self::Status {
            status,
            body: truncate_body(body),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
        }
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() <= BODY_LOG_LIMIT {
        return body;
    }
    let mut cut = BODY_LOG_LIMIT;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body.truncate(cut);
    body.push_str("...");
    body
}
