use serde::{Deserialize, Serialize};

use crate::model::ids::StudentId;

/// Profile of the student using the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub grade: String,
    pub school: String,
}

impl Student {
    #[must_use]
    pub fn new(
        id: StudentId,
        name: impl Into<String>,
        grade: impl Into<String>,
        school: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            grade: grade.into(),
            school: school.into(),
        }
    }

    /// Demo profile used when no student is configured.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(
            StudentId::new(1),
            "Koffi Mensah",
            "Terminale C",
            "Lycée Béhanzin",
        )
    }
}
