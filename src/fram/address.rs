use super::{
	Address,
	FramError,
	MAX_ADDRESS,
};

const MSB_SHIFT: u32 = 8;
const PAGE_SELECT_MASK: Address = 0x1_0000;
const PAGE_SELECT_SHIFT: u32 = 16;

/// Bytes needed on the wire to point the FRAM latch at an address.
///
/// The FM24V10 has 17 address bits, but only takes two address bytes: the
/// top bit ("page select") goes into bit 0 of the 7-bit slave address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WireAddress {
	pub high: u8,
	pub low: u8,
	pub bus_address: u8,
}

impl WireAddress {
	/// address bytes as sent after the slave address
	pub fn bytes(&self) -> [u8; 2] {
		[self.high, self.low]
	}

	pub fn page_select(&self) -> bool {
		0 != self.bus_address & 0x01
	}
}

pub fn check_address(address: Address) -> Result<(), FramError> {
	if address > MAX_ADDRESS {
		return Err(FramError::AddressOutOfRange(address));
	}
	Ok(())
}

pub fn encode(address: Address, base_bus_address: u8) -> Result<WireAddress, FramError> {
	check_address(address)?;

	let page_select = ((address & PAGE_SELECT_MASK) >> PAGE_SELECT_SHIFT) as u8;

	Ok(WireAddress {
		high: (address >> MSB_SHIFT) as u8,
		low: address as u8,
		bus_address: base_bus_address | page_select,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fram::BASE_BUS_ADDRESS;

	#[test]
	fn splits_address_bytes() {
		for &address in &[0x0_0000, 0x0_0001, 0x0_00ff, 0x0_0100, 0x0_1234, 0x0_ffff, 0x1_0000, 0x1_abcd, 0x1_ffff] {
			let wire = encode(address, BASE_BUS_ADDRESS).unwrap();
			assert_eq!([wire.high, wire.low], (address as u16).to_be_bytes(), "address 0x{:05x}", address);
			assert_eq!(wire.page_select(), 0 != address & 0x1_0000, "address 0x{:05x}", address);
		}
	}

	#[test]
	fn all_valid_addresses_roundtrip() {
		for address in 0..=MAX_ADDRESS {
			let wire = encode(address, BASE_BUS_ADDRESS).unwrap();
			let page = (wire.bus_address & 0x01) as Address;
			assert_eq!(page << 16 | (wire.high as Address) << 8 | wire.low as Address, address);
			assert_eq!(wire.bus_address & !0x01, BASE_BUS_ADDRESS);
		}
	}

	#[test]
	fn rejects_out_of_range() {
		for &address in &[MAX_ADDRESS + 1, 0x2_1234, 0xff_ffff, Address::max_value()] {
			assert_eq!(encode(address, BASE_BUS_ADDRESS), Err(FramError::AddressOutOfRange(address)));
		}
	}

	#[test]
	fn page_select_in_slave_address() {
		assert_eq!(encode(0x0_0000, BASE_BUS_ADDRESS).unwrap().bus_address, 0x50);
		// bit 15 is still a regular address bit
		assert_eq!(encode(0x0_8000, BASE_BUS_ADDRESS).unwrap().bus_address, 0x50);
		assert_eq!(encode(0x1_0000, BASE_BUS_ADDRESS).unwrap().bus_address, 0x51);
		assert_eq!(encode(0x1_8000, BASE_BUS_ADDRESS).unwrap().bus_address, 0x51);
	}

	#[test]
	fn strapped_slave_address() {
		let wire = encode(0x1_0203, 0x56).unwrap();
		assert_eq!(wire, WireAddress { high: 0x02, low: 0x03, bus_address: 0x57 });
		assert_eq!(wire.bytes(), [0x02, 0x03]);
	}
}
