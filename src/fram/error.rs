use std::fmt;

use failure::Fail;

use crate::i2c::TransferCode;
use super::Address;

/// flat code for any invalid argument
pub const PARAMETER_ERROR: u32 = 0x200;
/// flat code for a completion wait that ran into `Config::wait_timeout`
pub const TIMEOUT_ERROR: u32 = 0x400;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Read,
	Write,
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Direction::Read => write!(f, "read"),
			Direction::Write => write!(f, "write"),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Fail)]
pub enum FramError {
	#[fail(display = "address 0x{:x} out of range (max 0x1ffff)", _0)]
	AddressOutOfRange(Address),
	#[fail(display = "empty buffer")]
	EmptyBuffer,
	#[fail(display = "I2C transfer failed: {}", _0)]
	Transfer(TransferCode),
	#[fail(display = "timeout waiting for I2C {} to complete", _0)]
	Timeout(Direction),
}

impl FramError {
	/// invalid argument, detected before any bus activity
	pub fn is_parameter_error(&self) -> bool {
		match self {
			FramError::AddressOutOfRange(_) | FramError::EmptyBuffer => true,
			FramError::Transfer(_) | FramError::Timeout(_) => false,
		}
	}

	/// single integer result code: `PARAMETER_ERROR`, `TIMEOUT_ERROR` or the
	/// raw transfer code
	pub fn code(&self) -> u32 {
		match self {
			FramError::AddressOutOfRange(_) | FramError::EmptyBuffer => PARAMETER_ERROR,
			FramError::Transfer(code) => code.0,
			FramError::Timeout(_) => TIMEOUT_ERROR,
		}
	}
}
