//! Shared primitive types used across the planner.

/// A day of the planning week. Serialized as "Mon".."Sun".
pub type Day = chrono::Weekday;

/// Monotonic sequence number of a session event.
pub type Seq = u64;

/// Stable identifier of an employee, owned by the roster collaborator.
pub type EmployeeId = String;

/// Identifier of a shift inside one schedule.
pub type ShiftId = String;

/// Identifier of an employee request.
pub type RequestId = String;

/// The canonical planning session identifier.
pub type SessionId = String;
