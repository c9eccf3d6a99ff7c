pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS compliance_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    result_key TEXT NOT NULL UNIQUE,
    control_id TEXT NOT NULL,
    benchmark_id TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    platform_resource_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    status TEXT NOT NULL,
    severity TEXT NOT NULL,
    cost_impact REAL,
    evaluated_at INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS result_parent_benchmarks (
    benchmark_id TEXT NOT NULL,
    result_row INTEGER NOT NULL REFERENCES compliance_results(id) ON DELETE CASCADE,
    PRIMARY KEY (benchmark_id, result_row)
);

CREATE TABLE IF NOT EXISTS result_collections (
    result_row INTEGER NOT NULL REFERENCES compliance_results(id) ON DELETE CASCADE,
    collection_id TEXT NOT NULL,
    PRIMARY KEY (result_row, collection_id)
);

CREATE TABLE IF NOT EXISTS benchmarks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    parent_id TEXT,
    controls TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    benchmark_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'CREATED',
    error_message TEXT,
    error_type TEXT,
    records_processed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT
);

CREATE TABLE IF NOT EXISTS benchmark_summaries (
    benchmark_id TEXT NOT NULL,
    job_id INTEGER NOT NULL,
    evaluated_at_epoch INTEGER NOT NULL,
    security_score REAL NOT NULL,
    document TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (benchmark_id, job_id)
);

CREATE INDEX IF NOT EXISTS idx_results_benchmark ON compliance_results(benchmark_id);
CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
CREATE INDEX IF NOT EXISTS idx_jobs_benchmark ON jobs(benchmark_id);
";
