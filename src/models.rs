use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One consumer/company exchange in a complaint thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub owner: String,
    pub date: String,
    pub message: String,
}

/// Consumer's closing evaluation after the company answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalConsideration {
    pub message: Option<String>,
    pub service_note: Option<String>,
    pub would_do_business_again: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub date: String,
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
    pub final_consideration: Option<FinalConsideration>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub slug: String,
    pub total_complaints: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintsResponse {
    pub company: CompanyInfo,
    pub complaints: Vec<Complaint>,
    pub total_returned: usize,
    pub scraped_at: DateTime<Utc>,
}

/// JSON body for every non-2xx API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: Option<String>,
    pub status_code: u16,
}

/// Status filter accepted by the complaint list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    Evaluated,
    NotSolved,
    Solved,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Evaluated => "EVALUATED",
            StatusFilter::NotSolved => "NOT_SOLVED",
            StatusFilter::Solved => "SOLVED",
        }
    }

    /// Query fragment appended to the list page URL.
    pub fn query_fragment(&self) -> String {
        format!("&status={}", self.as_str())
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EVALUATED" => Ok(StatusFilter::Evaluated),
            "NOT_SOLVED" => Ok(StatusFilter::NotSolved),
            "SOLVED" => Ok(StatusFilter::Solved),
            other => Err(format!(
                "invalid status '{}', expected EVALUATED, NOT_SOLVED or SOLVED",
                other
            )),
        }
    }
}
