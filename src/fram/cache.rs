use super::{
	Address,
	INVALID_ADDRESS,
};

/// What the driver believes the FRAM address latch points to.
///
/// The latch can't be read back from the chip; this is only derived from the
/// transfers issued so far. A repowered chip or a glitch on the bus makes it
/// wrong without notice, `invalidate` forces a fresh address set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct AddressCache {
	current: Option<Address>,
}

impl AddressCache {
	pub fn new() -> Self {
		AddressCache { current: None }
	}

	pub fn get(&self) -> Option<Address> {
		self.current
	}

	pub fn set(&mut self, address: Address) {
		self.current = Some(address);
	}

	pub fn invalidate(&mut self) {
		self.current = None;
	}

	/// cached address, or `INVALID_ADDRESS` if unknown
	pub fn raw(&self) -> u32 {
		self.current.unwrap_or(INVALID_ADDRESS)
	}
}
