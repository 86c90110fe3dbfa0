#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AskRequest {
    question: String,
}

impl AskRequest {
    pub fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AskResponse {
    answer: String,
}

impl AskResponse {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn into_answer(self) -> String {
        self.answer
    }
}

/// Error body returned by the backend on a non-success status.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    detail: String,
}

impl ErrorDetail {
    pub fn new(detail: &str) -> Self {
        Self {
            detail: detail.to_string(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}
