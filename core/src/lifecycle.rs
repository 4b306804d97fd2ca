//! Booking state machine.
//!
//! ```text
//!   pending ──confirm──▶ confirmed
//!      │                    │
//!      └──cancel──▶ cancelled ◀──cancel──┘
//! ```
//!
//! `cancelled` is terminal. Cancelling it again is a no-op rather than an
//! error; confirming anything but `pending` is rejected.

use crate::error::{DomainError, Result};
use crate::ids::BookingId;
use crate::model::BookingStatus;

/// A requested lifecycle change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingCommand {
    /// Admin confirmation of a pending booking
    Confirm,
    /// Cancellation by the owner or an admin
    Cancel,
}

/// Outcome of applying a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Status changes to the contained value
    To(BookingStatus),
    /// Nothing to persist
    Unchanged,
}

/// Decide what `command` does to a booking currently in `current`.
///
/// # Errors
///
/// Returns [`DomainError::CannotConfirm`] when confirming a booking that is
/// not pending.
pub fn apply(
    booking_id: BookingId,
    current: BookingStatus,
    command: BookingCommand,
) -> Result<Transition> {
    match (command, current) {
        (BookingCommand::Confirm, BookingStatus::Pending) => {
            Ok(Transition::To(BookingStatus::Confirmed))
        }
        (BookingCommand::Confirm, status) => Err(DomainError::CannotConfirm { booking_id, status }),
        (BookingCommand::Cancel, BookingStatus::Pending | BookingStatus::Confirmed) => {
            Ok(Transition::To(BookingStatus::Cancelled))
        }
        (BookingCommand::Cancel, BookingStatus::Cancelled) => Ok(Transition::Unchanged),
    }
}

/// Translate a requested target status into a lifecycle command.
///
/// Returns `None` when the booking is already in `requested`.
///
/// # Errors
///
/// Returns [`DomainError::InvalidTransition`] for a move back to `pending`.
pub fn command_for_status(
    booking_id: BookingId,
    current: BookingStatus,
    requested: BookingStatus,
) -> Result<Option<BookingCommand>> {
    if current == requested {
        return Ok(None);
    }
    match requested {
        BookingStatus::Confirmed => Ok(Some(BookingCommand::Confirm)),
        BookingStatus::Cancelled => Ok(Some(BookingCommand::Cancel)),
        BookingStatus::Pending => Err(DomainError::InvalidTransition {
            booking_id,
            from: current,
            to: requested,
        }),
    }
}
