use crate::line::{ArticleId, ProjectId};
use serde::{Deserialize, Serialize};

/// Project as seen by the planner: enough to title a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
    pub client_code: String,
    pub client_name: String,
}

impl ProjectRef {
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        client_code: impl Into<String>,
        client_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            client_code: client_code.into(),
            client_name: client_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub id: ArticleId,
    pub name: String,
}

impl ArticleRef {
    pub fn new(id: ArticleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
