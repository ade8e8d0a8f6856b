//! Supervisor numeric codes and the derived service state.
//!
//! The status document carries raw integers for the pending action and the
//! failure bitmask. They are lifted into [`PendingAction`] and
//! [`FailureFlags`] here, and [`derive_state`] folds them into the closed
//! [`DerivedState`] enumeration exposed to callers.

use std::fmt;

use serde::Serialize;

/// Action queued on a service that the supervisor has not finished yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    /// Nothing queued.
    None,
    /// Alert notification in flight.
    Alert,
    /// Restart queued.
    Restart,
    /// Stop queued.
    Stop,
    /// Program execution queued.
    Exec,
    /// Unmonitor queued.
    Unmonitor,
    /// Start queued.
    Start,
    /// Monitor queued.
    Monitor,
    /// A code this client does not know about.
    Unrecognized(u32),
}

impl PendingAction {
    /// Maps the wire `pendingaction` value onto the enumeration.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Alert,
            2 => Self::Restart,
            3 => Self::Stop,
            4 => Self::Exec,
            5 => Self::Unmonitor,
            6 => Self::Start,
            7 => Self::Monitor,
            other => Self::Unrecognized(other),
        }
    }

    /// Returns the wire value.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Alert => 1,
            Self::Restart => 2,
            Self::Stop => 3,
            Self::Exec => 4,
            Self::Unmonitor => 5,
            Self::Start => 6,
            Self::Monitor => 7,
            Self::Unrecognized(code) => code,
        }
    }

    /// True when an action is queued.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::None)
    }
}

bitflags::bitflags! {
    /// Failure bits reported in a service's `status` element.
    ///
    /// Each bit corresponds to a check that is currently failing. `EXEC`
    /// (4096) is what the supervisor reports when a start or stop program
    /// exceeded its timeout ("failed to stop").
    pub struct FailureFlags: u32 {
        /// Checksum mismatch.
        const CHECKSUM = 0x1;
        /// Resource limit exceeded.
        const RESOURCE = 0x2;
        /// Check timed out.
        const TIMEOUT = 0x4;
        /// Timestamp changed.
        const TIMESTAMP = 0x8;
        /// Size changed.
        const SIZE = 0x10;
        /// Connection test failed.
        const CONNECTION = 0x20;
        /// Permission changed.
        const PERMISSION = 0x40;
        /// Owner changed.
        const UID = 0x80;
        /// Group changed.
        const GID = 0x100;
        /// Object does not exist.
        const NONEXIST = 0x200;
        /// Object has the wrong type.
        const INVALID = 0x400;
        /// Data collection failed.
        const DATA = 0x800;
        /// Start, stop, or restart program failed or timed out.
        const EXEC = 0x1000;
        /// Filesystem flags changed.
        const FSFLAG = 0x2000;
        /// ICMP test failed.
        const ICMP = 0x4000;
        /// Content match.
        const CONTENT = 0x8000;
        /// Supervisor instance event.
        const INSTANCE = 0x1_0000;
        /// Action requested.
        const ACTION = 0x2_0000;
        /// PID changed.
        const PID = 0x4_0000;
        /// Parent PID changed.
        const PPID = 0x8_0000;
        /// Heartbeat missed.
        const HEARTBEAT = 0x10_0000;
        /// Program exit status test failed.
        const STATUS = 0x20_0000;
        /// Uptime test failed.
        const UPTIME = 0x40_0000;
        /// Network link down.
        const LINK = 0x80_0000;
        /// Network link speed changed.
        const SPEED = 0x100_0000;
        /// Network link saturated.
        const SATURATION = 0x200_0000;
        /// Inbound byte limit exceeded.
        const BYTE_IN = 0x400_0000;
        /// Outbound byte limit exceeded.
        const BYTE_OUT = 0x800_0000;
        /// Inbound packet limit exceeded.
        const PACKET_IN = 0x1000_0000;
        /// Outbound packet limit exceeded.
        const PACKET_OUT = 0x2000_0000;
        /// Object exists when it should not.
        const EXIST = 0x4000_0000;
    }
}

/// Semantic state of a service derived from its raw codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedState {
    /// Monitored, nothing pending, no failures.
    Running,
    /// Not monitored; the supervisor makes no claims about it.
    Unknown,
    /// A start is queued.
    Starting,
    /// A stop is queued.
    Stopping,
    /// Some other action is queued.
    Pending,
    /// One or more known checks are failing.
    Failing,
    /// The status code has bits this client does not recognise.
    UnrecognizedCode(u32),
}

impl fmt::Display for DerivedState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => formatter.write_str("running"),
            Self::Unknown => formatter.write_str("unknown"),
            Self::Starting => formatter.write_str("starting"),
            Self::Stopping => formatter.write_str("stopping"),
            Self::Pending => formatter.write_str("pending"),
            Self::Failing => formatter.write_str("failing"),
            Self::UnrecognizedCode(code) => write!(formatter, "unrecognized status code {code}"),
        }
    }
}

/// Derives the semantic state of a service.
///
/// Precedence, first match wins:
/// 1. unmonitored services are [`DerivedState::Unknown`];
/// 2. a queued action yields `Starting`, `Stopping`, or the generic
///    `Pending`;
/// 3. a non-zero status made only of known failure bits is `Failing`;
/// 4. a non-zero status with unknown bits is `UnrecognizedCode`;
/// 5. otherwise the service is `Running`.
#[must_use]
pub fn derive_state(monitored: bool, status_code: u32, pending_code: u32) -> DerivedState {
    if !monitored {
        return DerivedState::Unknown;
    }
    match PendingAction::from_code(pending_code) {
        PendingAction::None => {}
        PendingAction::Start => return DerivedState::Starting,
        PendingAction::Stop => return DerivedState::Stopping,
        _ => return DerivedState::Pending,
    }
    if status_code == 0 {
        return DerivedState::Running;
    }
    match FailureFlags::from_bits(status_code) {
        Some(_) => DerivedState::Failing,
        None => DerivedState::UnrecognizedCode(status_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(4096, 0)]
    #[case(0, 3)]
    #[case(0, 6)]
    #[case(0x8000_0000, 9)]
    fn unmonitored_always_wins(#[case] status: u32, #[case] pending: u32) {
        assert_eq!(derive_state(false, status, pending), DerivedState::Unknown);
    }

    #[rstest]
    #[case::start(6, DerivedState::Starting)]
    #[case::stop(3, DerivedState::Stopping)]
    #[case::restart(2, DerivedState::Pending)]
    #[case::monitor(7, DerivedState::Pending)]
    #[case::unrecognized(42, DerivedState::Pending)]
    fn pending_actions_take_priority_over_failures(
        #[case] pending: u32,
        #[case] expected: DerivedState,
    ) {
        assert_eq!(derive_state(true, 4096, pending), expected);
    }

    #[test]
    fn known_failure_bits_are_failing() {
        assert_eq!(derive_state(true, 4096, 0), DerivedState::Failing);
        assert_eq!(derive_state(true, 0x200 | 0x20, 0), DerivedState::Failing);
    }

    #[test]
    fn unknown_failure_bits_are_surfaced() {
        assert_eq!(
            derive_state(true, 0x8000_0000, 0),
            DerivedState::UnrecognizedCode(0x8000_0000)
        );
    }

    #[test]
    fn healthy_service_is_running() {
        assert_eq!(derive_state(true, 0, 0), DerivedState::Running);
    }

    #[test]
    fn pending_codes_round_trip_through_the_enumeration() {
        for code in 0..=9 {
            assert_eq!(PendingAction::from_code(code).code(), code);
        }
        assert!(!PendingAction::from_code(0).is_pending());
        assert!(PendingAction::from_code(9).is_pending());
    }

    #[test]
    fn derived_state_renders_lowercase_names() {
        assert_eq!(DerivedState::Stopping.to_string(), "stopping");
        assert_eq!(
            DerivedState::UnrecognizedCode(7).to_string(),
            "unrecognized status code 7"
        );
    }
}
