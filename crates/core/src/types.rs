/// Visit primary keys are random UUIDs, generated by the application.
pub type VisitId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
