/// Schema for the paging cache.
///
/// Every row carries the `query_hash` of the search it was fetched for.
pub const SCHEMA: &str = r#"
-- Cached repositories, read back in (stars DESC, id ASC) order
CREATE TABLE IF NOT EXISTS repos (
    query_hash TEXT NOT NULL,
    id INTEGER NOT NULL,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL,
    description TEXT,
    url TEXT NOT NULL,
    stars INTEGER NOT NULL,
    forks INTEGER NOT NULL,
    language TEXT,
    PRIMARY KEY (query_hash, id)
);

CREATE INDEX IF NOT EXISTS idx_repos_order
    ON repos(query_hash, stars DESC, id);

-- Page tokens around each cached repository
CREATE TABLE IF NOT EXISTS remote_keys (
    query_hash TEXT NOT NULL,
    repo_id INTEGER NOT NULL,
    prev_key INTEGER,
    next_key INTEGER,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (query_hash, repo_id)
);
"#;
