pub mod directory;
pub mod reconcile;
pub mod store;

pub use directory::{EmployeeDirectory, MySqlEmployeeDirectory};
pub use reconcile::{AttendanceRequest, Reconciler};
pub use store::{AttendanceFilter, MySqlAttendanceStore};
