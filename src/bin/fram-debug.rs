#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

use fram_i2c::*;

use std::fs;
use std::io::{
	self,
	Read,
};
use std::process::exit;
use std::str;
use std::time::Duration;

use fram_i2c::fram::{
	CAPACITY,
	MAX_ADDRESS,
};
use fram_i2c::i2c::Transport;

const DEFAULT_DEVICE: &str = "/dev/i2c-1";
// i2c-dev refuses messages longer than 8192 bytes, including the address bytes
const CHUNK_SIZE: usize = 4096;

/// integer parameter, hex with "0x" prefix or decimal
struct Number(u32);

impl str::FromStr for Number {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let n = match strip_hex_prefix(s) {
			Some(digits) => u32::from_str_radix(digits, 16)?,
			None => s.parse::<u32>()?,
		};
		Ok(Number(n))
	}
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
	if s.starts_with("0x") || s.starts_with("0X") {
		Some(&s[2..])
	} else {
		None
	}
}

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: str::FromStr,
	failure::Error: From<<T as str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_address(matches: &clap::ArgMatches, name: &str) -> AResult<Address> {
	let Number(address) = get_param(matches, name)?;
	ensure!(address <= MAX_ADDRESS, "{} 0x{:x} out of range (max 0x{:x})", name, address, MAX_ADDRESS);
	Ok(address)
}

fn get_count(matches: &clap::ArgMatches, address: Address) -> AResult<usize> {
	let Number(count) = get_param(matches, "COUNT")?;
	ensure!(count > 0, "COUNT must not be zero");
	ensure!(count <= CAPACITY - address, "COUNT {} exceeds end of memory", count);
	Ok(count as usize)
}

fn config(matches: &clap::ArgMatches) -> AResult<Config> {
	let mut config = Config::default();
	if matches.is_present("slave") {
		let Number(slave) = get_param(matches, "slave")?;
		ensure!(slave < 0x80 && 0 == slave & 0x01, "invalid slave address 0x{:x} (7-bit, page select bit cleared)", slave);
		config.slave_address = slave as u8;
	}
	if matches.is_present("timeout") {
		let Number(ms) = get_param(matches, "timeout")?;
		config.wait_timeout = if 0 == ms { None } else { Some(Duration::from_millis(ms as u64)) };
	}
	config.wrap_after_write = matches.is_present("wrap");
	Ok(config)
}

fn hexdump(start: Address, data: &[u8]) {
	for (i, chunk) in data.chunks(16).enumerate() {
		print!("{:05x} ", start as usize + 16 * i);
		for (j, b) in chunk.iter().enumerate() {
			if 8 == j {
				print!(" ");
			}
			print!(" {:02x}", b);
		}
		println!("");
	}
}

fn read_range<T: Transport>(fram: &mut Fram<T>, address: Address, count: usize) -> AResult<Vec<u8>> {
	let mut data = vec![0u8; count];
	let mut offset = 0;
	for chunk in data.chunks_mut(CHUNK_SIZE) {
		fram.read_from_address(address + offset as u32, chunk)?;
		offset += chunk.len();
	}
	Ok(data)
}

fn status<T: Transport>(fram: &mut Fram<T>) -> AResult<()> {
	let status = fram.bus_status();
	println!("slave address: 0x{:02x}", fram.slave_address());
	println!("master status: {:?}", status);
	Ok(())
}

fn set_address<T: Transport>(fram: &mut Fram<T>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m, "ADDRESS")?;
	fram.set_address(address, Wait::Blocking)?;
	info!("FRAM latch set to 0x{:05x}", address);
	Ok(())
}

fn read<T: Transport>(fram: &mut Fram<T>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m, "ADDRESS")?;
	let count = get_count(sub_m, address)?;
	let data = read_range(fram, address, count)?;
	hexdump(address, &data);
	Ok(())
}

fn dump<T: Transport>(fram: &mut Fram<T>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m, "ADDRESS")?;
	let count = get_count(sub_m, address)?;
	let stdout = io::stdout();
	let copied = io::copy(&mut fram.cursor(address).take(count as u64), &mut stdout.lock())?;
	ensure!(copied == count as u64, "short read: {} of {} bytes", copied, count);
	Ok(())
}

fn write<T: Transport>(fram: &mut Fram<T>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m, "ADDRESS")?;
	let mut data = Vec::new();
	for byte in sub_m.values_of("BYTES").into_iter().flatten() {
		data.push(parse_byte(byte)?);
	}
	ensure!(data.len() as u32 <= CAPACITY - address, "{} bytes exceed end of memory", data.len());
	fram.write_to_address(address, &data)?;
	info!("wrote {} bytes at 0x{:05x}", data.len(), address);
	Ok(())
}

/// hex byte, "0x" prefix optional
fn parse_byte(byte: &str) -> AResult<u8> {
	let digits = strip_hex_prefix(byte).unwrap_or(byte);
	u8::from_str_radix(digits, 16).map_err(|e| format_err!("invalid byte {:?}: {}", byte, e))
}

fn load<T: Transport>(fram: &mut Fram<T>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_address(sub_m, "ADDRESS")?;
	let path = match sub_m.value_of("FILE") {
		Some(p) => p,
		None => bail!("missing parameter FILE"),
	};
	let image = fs::read(path).map_err(|e| format_err!("couldn't read {}: {}", path, e))?;
	ensure!(!image.is_empty(), "{} is empty", path);
	ensure!(image.len() as u32 <= CAPACITY - address, "{} ({} bytes) exceeds end of memory", path, image.len());

	let mut offset = 0;
	for chunk in image.chunks(CHUNK_SIZE) {
		fram.write_to_address(address + offset as u32, chunk)?;
		offset += chunk.len();
	}

	// verify
	let readback = read_range(fram, address, image.len())?;
	for (i, (expected, found)) in image.iter().zip(readback.iter()).enumerate() {
		ensure!(expected == found,
			"Verify failed at {:05x}: expected {:02x}, FRAM has {:02x}", address as usize + i, expected, found
		);
	}
	info!("loaded {} bytes from {} at 0x{:05x}", image.len(), path, address);
	Ok(())
}

fn run<T: Transport>(mut fram: Fram<T>, matches: &clap::ArgMatches) -> AResult<()> {
	let fram = &mut fram;
	match matches.subcommand() {
		("status", _) => {
			status(fram)
		}
		("set_address", Some(sub_m)) => {
			set_address(fram, sub_m)
		}
		("read", Some(sub_m)) => {
			read(fram, sub_m)
		}
		("dump", Some(sub_m)) => {
			dump(fram, sub_m)
		}
		("write", Some(sub_m)) => {
			write(fram, sub_m)
		}
		("load", Some(sub_m)) => {
			load(fram, sub_m)
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg device: -d --device +takes_value "I2C bus device (default: /dev/i2c-1)")
		(@arg slave: -a --slave +takes_value "7-bit slave address of the FRAM (default: 0x50)")
		(@arg timeout: -t --timeout +takes_value "timeout for bus transfers in ms, 0 waits forever (default: 100)")
		(@arg wrap: --wrap "wrap the tracked address at the end of memory after writes")
		(@arg simulate: --simulate "use a simulated (empty) FRAM instead of a real bus")
		(@subcommand status =>
			(about: "show I2C master status")
		)
		(@subcommand set_address =>
			(about: "set the FRAM address latch")
			(@arg ADDRESS: +required "address to set")
		)
		(@subcommand read =>
			(about: "hexdump FRAM memory")
			(@arg ADDRESS: +required "first address to read")
			(@arg COUNT: +required "number of bytes to read")
		)
		(@subcommand dump =>
			(about: "dump FRAM memory as binary to stdout")
			(@arg ADDRESS: +required "first address to read")
			(@arg COUNT: +required "number of bytes to read")
		)
		(@subcommand write =>
			(about: "write bytes to FRAM")
			(@arg ADDRESS: +required "first address to write")
			(@arg BYTES: +required +multiple "bytes to write (hex)")
		)
		(@subcommand load =>
			(about: "write a file to FRAM and verify it")
			(@arg ADDRESS: +required "first address to write")
			(@arg FILE: +required "file to load")
		)
	).get_matches();

	let config = config(&matches)?;

	if matches.is_present("simulate") {
		warn!("using simulated FRAM, nothing is written to a real device");
		run(Fram::start(sim::SimulatedFram::with_slave_address(config.slave_address), config), &matches)
	} else {
		let device = matches.value_of("device").unwrap_or(DEFAULT_DEVICE);
		let bus = i2c::open_bus(device)?;
		run(Fram::start(bus, config), &matches)
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn byte_prefixes() {
		assert_eq!(parse_byte("12").unwrap(), 0x12);
		assert_eq!(parse_byte("0x12").unwrap(), 0x12);
		assert_eq!(parse_byte("0X12").unwrap(), 0x12);
		assert!(parse_byte("0x0x12").is_err());
		assert!(parse_byte("0x").is_err());
		assert!(parse_byte("100").is_err());
	}

	#[test]
	fn number_prefixes() {
		assert_eq!("0x1ffff".parse::<Number>().unwrap().0, 0x1_ffff);
		assert_eq!("0X10".parse::<Number>().unwrap().0, 0x10);
		assert_eq!("42".parse::<Number>().unwrap().0, 42);
		assert!("0x0x10".parse::<Number>().is_err());
	}
}
