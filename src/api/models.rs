use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub benchmark_id: String,
}

#[derive(Serialize)]
pub struct JobCreatedResponse {
    pub job_id: u64,
    pub benchmark_id: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
