use std::fmt;

// master status flags
const MSTAT_RD_CMPLT:       u32 = 0x0000_0001; // read transfer complete
const MSTAT_WR_CMPLT:       u32 = 0x0000_0002; // write transfer complete
const MSTAT_XFER_INP:       u32 = 0x0000_0004; // transfer in progress
const MSTAT_XFER_HALT:      u32 = 0x0000_0008; // transfer halted (no STOP sent)
const MSTAT_ERR_SHORT_XFER: u32 = 0x0000_0010; // slave NAKed before all bytes were sent
const MSTAT_ERR_ADDR_NAK:   u32 = 0x0000_0020; // slave NAKed its address
const MSTAT_ERR_ARB_LOST:   u32 = 0x0000_0040;
const MSTAT_ERR_BUS_ERROR:  u32 = 0x0000_0100;
const MSTAT_ERR_XFER:       u32 = 0x0000_8000; // summary: any error occured

const MSTAT_ERR_MASK: u32 = 0
	| MSTAT_ERR_SHORT_XFER
	| MSTAT_ERR_ADDR_NAK
	| MSTAT_ERR_ARB_LOST
	| MSTAT_ERR_BUS_ERROR
	| MSTAT_ERR_XFER
;

/// Snapshot of the bus master status register.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MasterStatus(pub u32);

impl MasterStatus {
	pub const READ_COMPLETE: MasterStatus = MasterStatus(MSTAT_RD_CMPLT);
	pub const WRITE_COMPLETE: MasterStatus = MasterStatus(MSTAT_WR_CMPLT);
	pub const IN_PROGRESS: MasterStatus = MasterStatus(MSTAT_XFER_INP);
	pub const HALTED: MasterStatus = MasterStatus(MSTAT_XFER_HALT);
	pub const SHORT_TRANSFER: MasterStatus = MasterStatus(MSTAT_ERR_SHORT_XFER);
	pub const ADDRESS_NAK: MasterStatus = MasterStatus(MSTAT_ERR_ADDR_NAK);
	pub const ARBITRATION_LOST: MasterStatus = MasterStatus(MSTAT_ERR_ARB_LOST);
	pub const BUS_ERROR: MasterStatus = MasterStatus(MSTAT_ERR_BUS_ERROR);
	pub const TRANSFER_ERROR: MasterStatus = MasterStatus(MSTAT_ERR_XFER);

	pub fn contains(&self, flags: MasterStatus) -> bool {
		flags.0 == self.0 & flags.0
	}

	pub fn insert(&mut self, flags: MasterStatus) -> &mut Self {
		self.0 |= flags.0;
		self
	}

	pub fn remove(&mut self, flags: MasterStatus) -> &mut Self {
		self.0 &= !flags.0;
		self
	}

	pub fn is_read_complete(&self) -> bool {
		0 != self.0 & MSTAT_RD_CMPLT
	}
	pub fn is_write_complete(&self) -> bool {
		0 != self.0 & MSTAT_WR_CMPLT
	}
	pub fn is_in_progress(&self) -> bool {
		0 != self.0 & MSTAT_XFER_INP
	}
	pub fn is_halted(&self) -> bool {
		0 != self.0 & MSTAT_XFER_HALT
	}
	pub fn is_short_transfer(&self) -> bool {
		0 != self.0 & MSTAT_ERR_SHORT_XFER
	}
	pub fn is_address_nak(&self) -> bool {
		0 != self.0 & MSTAT_ERR_ADDR_NAK
	}
	pub fn is_arbitration_lost(&self) -> bool {
		0 != self.0 & MSTAT_ERR_ARB_LOST
	}
	pub fn is_bus_error(&self) -> bool {
		0 != self.0 & MSTAT_ERR_BUS_ERROR
	}
	pub fn has_error(&self) -> bool {
		0 != self.0 & MSTAT_ERR_MASK
	}
}

impl fmt::Display for MasterStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x}", self.0)
	}
}

impl fmt::Debug for MasterStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x} (", self.0)?;
		if self.is_read_complete() { write!(f, " [RD_CMPLT]")?; }
		if self.is_write_complete() { write!(f, " [WR_CMPLT]")?; }
		if self.is_in_progress() { write!(f, " [XFER_INP]")?; }
		if self.is_halted() { write!(f, " [XFER_HALT]")?; }
		if self.is_short_transfer() { write!(f, " [ERR_SHORT_XFER]")?; }
		if self.is_address_nak() { write!(f, " [ERR_ADDR_NAK]")?; }
		if self.is_arbitration_lost() { write!(f, " [ERR_ARB_LOST]")?; }
		if self.is_bus_error() { write!(f, " [ERR_BUS_ERROR]")?; }
		if 0 != self.0 & MSTAT_ERR_XFER { write!(f, " [ERR_XFER]")?; }
		write!(f, " )")
	}
}

// transfer result codes
const MSTR_NO_ERROR:        u32 = 0x00;
const MSTR_BUS_BUSY:        u32 = 0x01; // bus is busy, transfer not started
const MSTR_NOT_READY:       u32 = 0x02; // master is still busy with a previous transfer
const MSTR_ERR_LB_NAK:      u32 = 0x04; // slave NAKed (address or data)
const MSTR_ERR_ARB_LOST:    u32 = 0x08;
const MSTR_ERR_BUS_ERR:     u32 = 0x10;
const MSTR_ERR_ABORT_START: u32 = 0x20; // transfer aborted before START was generated

/// Result code returned by a `Transport` transfer call.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransferCode(pub u32);

impl TransferCode {
	pub const NO_ERROR: TransferCode = TransferCode(MSTR_NO_ERROR);
	pub const BUS_BUSY: TransferCode = TransferCode(MSTR_BUS_BUSY);
	pub const NOT_READY: TransferCode = TransferCode(MSTR_NOT_READY);
	pub const ERR_LB_NAK: TransferCode = TransferCode(MSTR_ERR_LB_NAK);
	pub const ERR_ARB_LOST: TransferCode = TransferCode(MSTR_ERR_ARB_LOST);
	pub const ERR_BUS_ERR: TransferCode = TransferCode(MSTR_ERR_BUS_ERR);
	pub const ERR_ABORT_START: TransferCode = TransferCode(MSTR_ERR_ABORT_START);

	/// Whether any bit of `pattern` is set in this code.
	pub fn intersects(&self, pattern: TransferCode) -> bool {
		0 != self.0 & pattern.0
	}
}

impl fmt::Display for TransferCode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if self.0 == MSTR_NO_ERROR {
			return write!(f, "0x{:02x} [NO_ERROR]", self.0);
		}
		write!(f, "0x{:02x}", self.0)?;
		if 0 != self.0 & MSTR_BUS_BUSY { write!(f, " [BUS_BUSY]")?; }
		if 0 != self.0 & MSTR_NOT_READY { write!(f, " [NOT_READY]")?; }
		if 0 != self.0 & MSTR_ERR_LB_NAK { write!(f, " [ERR_LB_NAK]")?; }
		if 0 != self.0 & MSTR_ERR_ARB_LOST { write!(f, " [ERR_ARB_LOST]")?; }
		if 0 != self.0 & MSTR_ERR_BUS_ERR { write!(f, " [ERR_BUS_ERR]")?; }
		if 0 != self.0 & MSTR_ERR_ABORT_START { write!(f, " [ERR_ABORT_START]")?; }
		Ok(())
	}
}

impl fmt::Debug for TransferCode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "TransferCode({})", self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_flags() {
		let mut status = MasterStatus::default();
		assert!(!status.is_write_complete());
		status.insert(MasterStatus::WRITE_COMPLETE).insert(MasterStatus::ADDRESS_NAK);
		assert!(status.is_write_complete());
		assert!(!status.is_read_complete());
		assert!(status.has_error());
		assert!(status.contains(MasterStatus::WRITE_COMPLETE));

		status.remove(MasterStatus::ADDRESS_NAK);
		assert!(!status.has_error());
		assert_eq!(status, MasterStatus::WRITE_COMPLETE);
	}

	#[test]
	fn status_debug_lists_flags() {
		let status = MasterStatus(MSTAT_RD_CMPLT | MSTAT_ERR_ADDR_NAK | MSTAT_ERR_XFER);
		assert_eq!(format!("{:?}", status), "0x8021 ( [RD_CMPLT] [ERR_ADDR_NAK] [ERR_XFER] )");
		assert_eq!(status.to_string(), "0x8021");
	}

	#[test]
	fn transfer_code_display() {
		assert_eq!(TransferCode::NO_ERROR.to_string(), "0x00 [NO_ERROR]");
		assert_eq!(TransferCode::ERR_LB_NAK.to_string(), "0x04 [ERR_LB_NAK]");
		assert_eq!(TransferCode(0x0c).to_string(), "0x0c [ERR_LB_NAK] [ERR_ARB_LOST]");
	}

	#[test]
	fn transfer_code_intersects() {
		assert!(TransferCode(0x14).intersects(TransferCode::ERR_BUS_ERR));
		assert!(!TransferCode(0x14).intersects(TransferCode::ERR_ARB_LOST));
		// the all-zero pattern never intersects anything
		assert!(!TransferCode(0xff).intersects(TransferCode::NO_ERROR));
	}
}
