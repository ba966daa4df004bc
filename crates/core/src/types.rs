/// Catalog primary keys (project types, roles, faculties, problem types) are
/// PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Entity identifiers (applications, projects, users, files, links) are opaque UUIDs.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date without a time zone (application deadlines).
pub type Date = chrono::NaiveDate;
