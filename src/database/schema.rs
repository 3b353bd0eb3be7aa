// Registry of tables exposed through the generic data API.
//
// Column lists double as an allowlist: filters, ordering and writes may only
// name columns declared here, so identifiers never come from the client.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Integer,
    Numeric,
    Real,
    Boolean,
    Timestamp,
    UuidArray,
    TextArray,
}

impl ColumnType {
    /// Postgres type used to cast bound parameters.
    pub fn sql_cast(&self) -> &'static str {
        match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Numeric => "numeric",
            ColumnType::Real => "real",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamptz",
            ColumnType::UuidArray => "uuid[]",
            ColumnType::TextArray => "text[]",
        }
    }

    /// Element type for array columns
    pub fn element(&self) -> Option<ColumnType> {
        match self {
            ColumnType::UuidArray => Some(ColumnType::Uuid),
            ColumnType::TextArray => Some(ColumnType::Text),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.element().is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub writable: bool,
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty, writable: true }
}

const fn sys(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty, writable: false }
}

/// Who may read rows of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    Everyone,
    /// Only rows whose owner column is the caller
    Owner,
    /// Rows where any of these columns is the caller
    Participants(&'static [&'static str]),
    AdminOnly,
}

/// Who may modify rows of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    AdminOnly,
    /// Inserts are stamped with the caller; updates and deletes are limited
    /// to the caller's rows.
    Owner,
}

#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub owner_column: Option<&'static str>,
    pub read: ReadScope,
    pub write: WriteScope,
    pub insertable: bool,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

use ColumnType::*;

static INSTITUTIONS: TableSpec = TableSpec {
    name: "institutions",
    columns: &[
        sys("id", Uuid),
        col("name", Text),
        col("country", Text),
        col("website", Text),
        sys("created_at", Timestamp),
    ],
    owner_column: None,
    read: ReadScope::Everyone,
    write: WriteScope::AdminOnly,
    insertable: true,
};

static COURSES: TableSpec = TableSpec {
    name: "courses",
    columns: &[
        sys("id", Uuid),
        col("institution_id", Uuid),
        col("code", Text),
        col("title", Text),
        col("description", Text),
        col("credits", Integer),
        sys("created_at", Timestamp),
    ],
    owner_column: None,
    read: ReadScope::Everyone,
    write: WriteScope::AdminOnly,
    insertable: true,
};

static PROFILES: TableSpec = TableSpec {
    name: "profiles",
    columns: &[
        sys("id", Uuid),
        col("full_name", Text),
        sys("role", Text),
        sys("avatar_url", Text),
        col("bio", Text),
        col("institution_id", Uuid),
        sys("created_at", Timestamp),
        sys("updated_at", Timestamp),
    ],
    owner_column: Some("id"),
    read: ReadScope::Everyone,
    write: WriteScope::Owner,
    insertable: false,
};

static EXAMS: TableSpec = TableSpec {
    name: "exams",
    columns: &[
        sys("id", Uuid),
        sys("user_id", Uuid),
        col("course_id", Uuid),
        col("title", Text),
        col("exam_date", Timestamp),
        col("duration_minutes", Integer),
        col("location", Text),
        col("notes", Text),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("user_id"),
    read: ReadScope::Owner,
    write: WriteScope::Owner,
    insertable: true,
};

static ASSIGNMENTS: TableSpec = TableSpec {
    name: "assignments",
    columns: &[
        sys("id", Uuid),
        sys("user_id", Uuid),
        col("course_id", Uuid),
        col("title", Text),
        col("due_date", Timestamp),
        col("status", Text),
        col("notes", Text),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("user_id"),
    read: ReadScope::Owner,
    write: WriteScope::Owner,
    insertable: true,
};

static STUDY_PARTNERS: TableSpec = TableSpec {
    name: "study_partners",
    columns: &[
        sys("id", Uuid),
        sys("user_id", Uuid),
        col("institution_id", Uuid),
        col("course_ids", UuidArray),
        col("availability", Text),
        col("bio", Text),
        col("looking", Boolean),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("user_id"),
    read: ReadScope::Everyone,
    write: WriteScope::Owner,
    insertable: true,
};

// Created through /api/sessions so expiry is derived and the text fields that
// reach calendar exports are validated. Only the course link is editable here.
static SHARED_SESSIONS: TableSpec = TableSpec {
    name: "shared_sessions",
    columns: &[
        sys("id", Uuid),
        sys("host_id", Uuid),
        col("course_id", Uuid),
        sys("title", Text),
        sys("description", Text),
        sys("meeting_link", Text),
        sys("scheduled_start_time", Timestamp),
        sys("estimated_duration", Integer),
        sys("expires_at", Timestamp),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("host_id"),
    read: ReadScope::Everyone,
    write: WriteScope::Owner,
    insertable: false,
};

static TUTORS: TableSpec = TableSpec {
    name: "tutors",
    columns: &[
        sys("id", Uuid),
        sys("user_id", Uuid),
        col("subjects", TextArray),
        col("hourly_rate", Numeric),
        sys("rating", Real),
        col("bio", Text),
        col("available", Boolean),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("user_id"),
    read: ReadScope::Everyone,
    write: WriteScope::Owner,
    insertable: true,
};

static NOTIFICATIONS: TableSpec = TableSpec {
    name: "notifications",
    columns: &[
        sys("id", Uuid),
        sys("user_id", Uuid),
        col("title", Text),
        col("body", Text),
        sys("read_at", Timestamp),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("user_id"),
    read: ReadScope::Owner,
    write: WriteScope::Owner,
    insertable: true,
};

static MESSAGES: TableSpec = TableSpec {
    name: "messages",
    columns: &[
        sys("id", Uuid),
        sys("sender_id", Uuid),
        col("recipient_id", Uuid),
        col("body", Text),
        sys("read_at", Timestamp),
        sys("created_at", Timestamp),
    ],
    owner_column: Some("sender_id"),
    read: ReadScope::Participants(&["sender_id", "recipient_id"]),
    write: WriteScope::Owner,
    insertable: true,
};

static USER_REPORTS: TableSpec = TableSpec {
    name: "user_reports",
    columns: &[
        sys("id", Uuid),
        sys("reporter_id", Uuid),
        col("reported_user_id", Uuid),
        col("reason", Text),
        sys("status", Text),
        sys("created_at", Timestamp),
        sys("resolved_at", Timestamp),
    ],
    owner_column: Some("reporter_id"),
    read: ReadScope::AdminOnly,
    write: WriteScope::Owner,
    insertable: true,
};

/// Tables reachable through `/api/data/:table` and `/api/find/:table`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Institutions,
    Courses,
    Profiles,
    Exams,
    Assignments,
    StudyPartners,
    SharedSessions,
    Tutors,
    Notifications,
    Messages,
    UserReports,
}

impl Table {
    pub const ALL: [Table; 11] = [
        Table::Institutions,
        Table::Courses,
        Table::Profiles,
        Table::Exams,
        Table::Assignments,
        Table::StudyPartners,
        Table::SharedSessions,
        Table::Tutors,
        Table::Notifications,
        Table::Messages,
        Table::UserReports,
    ];

    pub fn spec(&self) -> &'static TableSpec {
        match self {
            Table::Institutions => &INSTITUTIONS,
            Table::Courses => &COURSES,
            Table::Profiles => &PROFILES,
            Table::Exams => &EXAMS,
            Table::Assignments => &ASSIGNMENTS,
            Table::StudyPartners => &STUDY_PARTNERS,
            Table::SharedSessions => &SHARED_SESSIONS,
            Table::Tutors => &TUTORS,
            Table::Notifications => &NOTIFICATIONS,
            Table::Messages => &MESSAGES,
            Table::UserReports => &USER_REPORTS,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("Unknown table '{}'", s))
    }
}
