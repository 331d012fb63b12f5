pub mod booking;
pub mod calendar;
pub mod config;
pub mod error;
pub mod line;
pub mod line_validation;
pub mod persistence;
pub mod planner;
pub mod proration;
pub mod ranges;
pub mod reference;
pub mod telemetry;
pub mod view;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use booking::{BookingContext, BookingRecord, NewBooking};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::PlannerConfig;
pub use error::{AllocationError, DeletionError, PlanningError, PlanningResult, RepairError};
pub use line::{LineGroup, LineRole, Planning, ProjectLine, ProjectLineRow};
pub use persistence::{LineStore, MemoryLineStore, PersistenceError, PlannerStore};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteLineStore;
pub use planner::{Allocation, Deletion, LinePlanner, NewProjectLine, RemainderSplit, SyncOutcome};
pub use proration::{Proration, prorate, round2};
pub use ranges::{DayRange, compact_days};
pub use reference::{ArticleRef, ProjectRef};
