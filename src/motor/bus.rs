// XL330 serial protocol (Dynamixel Protocol 2.0 subset)
//
// Packet format: [0xFF, 0xFF, 0xFD, 0x00, ID, LenL, LenH, Instruction,
// Params..., CrcL, CrcH], with CRC-16 over everything before the CRC field.

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// Default serial configuration for XL330 servos
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Broadcast ID; used for sync writes, which get no status response
pub const BROADCAST_ID: u8 = 0xFE;

/// Packet header bytes
const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// Status packet instruction byte
const STATUS: u8 = 0x55;

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
    RegWrite = 0x04,
    Action = 0x05,
    Reboot = 0x08,
    SyncRead = 0x82,
    SyncWrite = 0x83,
}

/// Control-table addresses for the XL330-W250
#[repr(u16)]
#[derive(Debug, Clone, Copy)]
pub enum Register {
    // EEPROM area (persists across power cycles)
    ModelNumber = 0, // 2 bytes, read-only
    Id = 7,          // 1 byte
    BaudRate = 8,    // 1 byte

    // RAM area (volatile)
    OperatingMode = 11,    // 1 byte, see OperatingMode
    TorqueEnable = 64,     // 1 byte: 0=off, 1=on
    Led = 65,              // 1 byte
    GoalVelocity = 104,    // 4 bytes, signed (velocity mode)
    GoalPosition = 116,    // 4 bytes
    PresentVelocity = 128, // 4 bytes, read-only, signed
    PresentPosition = 132, // 4 bytes, read-only
}

/// Operating modes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatingMode {
    Current = 0,
    Velocity = 1,
    Position = 3,
    ExtendedPosition = 4,
    Pwm = 16,
}

/// Error types for bus communication
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from joint {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("CRC mismatch for joint {id}")]
    CrcMismatch { id: u8 },

    #[error("Joint {id} returned error status: 0x{status:02X}")]
    JointError { id: u8, status: u8 },

    #[error("Timeout waiting for response from joint {id}")]
    Timeout { id: u8 },
}

pub type Result<T> = std::result::Result<T, BusError>;

/// XL330 bus - handles serial communication with the servos
pub struct Xl330Bus {
    port: Box<dyn SerialPort>,
}

impl Xl330Bus {
    /// Open a new connection to the joint bus
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// CRC-16 over a packet prefix (poly 0x8005, init 0, MSB-first)
    fn crc16(data: &[u8]) -> u16 {
        let mut crc: u16 = 0;
        for &byte in data {
            crc ^= (byte as u16) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 != 0 {
                    (crc << 1) ^ 0x8005
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    /// Build a packet with header, length, and CRC
    // TODO: byte-stuff 0xFF 0xFF 0xFD runs inside params; none of the
    // registers we write can currently produce one, but raw overrides get
    // close to the edge of that assumption
    fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 3) as u16; // instruction + crc
        let mut packet = Vec::with_capacity(10 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(id);
        packet.extend_from_slice(&length.to_le_bytes());
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        let crc = Self::crc16(&packet);
        packet.extend_from_slice(&crc.to_le_bytes());

        packet
    }

    /// Send a packet down the wire
    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read a status packet, returning its parameter bytes
    fn read_response(&mut self, expected_id: u8) -> Result<Vec<u8>> {
        let mut prefix = [0u8; 7]; // header + id + length
        self.port.read_exact(&mut prefix).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                BusError::Timeout { id: expected_id }
            } else {
                BusError::Io(e)
            }
        })?;

        if prefix[..4] != HEADER {
            return Err(BusError::InvalidResponse {
                id: expected_id,
                reason: format!("Invalid header: {:02X?}", &prefix[..4]),
            });
        }

        let id = prefix[4];
        if id != expected_id {
            return Err(BusError::InvalidResponse {
                id: expected_id,
                reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
            });
        }

        // Remaining bytes: instruction + error + params + crc = length
        let length = u16::from_le_bytes([prefix[5], prefix[6]]) as usize;
        if length < 4 {
            return Err(BusError::InvalidResponse {
                id,
                reason: format!("Status length {} too short", length),
            });
        }
        let mut remaining = vec![0u8; length];
        self.port.read_exact(&mut remaining)?;

        // Verify CRC over header..params
        let mut crc_data = prefix.to_vec();
        crc_data.extend_from_slice(&remaining[..length - 2]);
        let expected_crc = Self::crc16(&crc_data);
        let received_crc = u16::from_le_bytes([remaining[length - 2], remaining[length - 1]]);
        if expected_crc != received_crc {
            return Err(BusError::CrcMismatch { id });
        }

        if remaining[0] != STATUS {
            return Err(BusError::InvalidResponse {
                id,
                reason: format!("Expected status instruction, got 0x{:02X}", remaining[0]),
            });
        }

        // Check error status; bit 7 is the hardware-alert flag, the low
        // bits are the actual protocol error number
        let error_status = remaining[1] & 0x7F;
        if error_status != 0 {
            return Err(BusError::JointError {
                id,
                status: error_status,
            });
        }

        // Return parameters (excluding instruction, error byte, and crc)
        Ok(remaining[2..length - 2].to_vec())
    }

    /// Ping a servo to check if it's connected
    pub fn ping(&mut self, id: u8) -> Result<bool> {
        let packet = Self::build_packet(id, Instruction::Ping, &[]);
        self.send_packet(&packet)?;

        match self.read_response(id) {
            Ok(_) => Ok(true),
            Err(BusError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write a single byte to a register
    pub fn write_u8(&mut self, id: u8, register: Register, value: u8) -> Result<()> {
        let addr = (register as u16).to_le_bytes();
        let params = [addr[0], addr[1], value];
        let packet = Self::build_packet(id, Instruction::Write, &params);
        debug!(
            "Write u8 to joint {}: reg={:?}, value={}",
            id, register, value
        );
        self.send_packet(&packet)?;

        // Read status response
        let _ = self.read_response(id)?;
        Ok(())
    }

    /// Write four bytes (little-endian) to a register
    pub fn write_u32(&mut self, id: u8, register: Register, value: u32) -> Result<()> {
        let addr = (register as u16).to_le_bytes();
        let data = value.to_le_bytes();
        let params = [addr[0], addr[1], data[0], data[1], data[2], data[3]];
        let packet = Self::build_packet(id, Instruction::Write, &params);
        debug!(
            "Write u32 to joint {}: reg={:?}, value={}",
            id, register, value
        );
        self.send_packet(&packet)?;

        let _ = self.read_response(id)?;
        Ok(())
    }

    /// Write a signed 32-bit value (for velocity)
    pub fn write_i32(&mut self, id: u8, register: Register, value: i32) -> Result<()> {
        // Protocol 2.0 velocities are plain two's complement
        self.write_u32(id, register, value as u32)
    }

    /// Read a single byte from a register
    pub fn read_u8(&mut self, id: u8, register: Register) -> Result<u8> {
        let addr = (register as u16).to_le_bytes();
        let params = [addr[0], addr[1], 1, 0]; // address, length
        let packet = Self::build_packet(id, Instruction::Read, &params);
        self.send_packet(&packet)?;

        let response = self.read_response(id)?;
        if response.is_empty() {
            return Err(BusError::InvalidResponse {
                id,
                reason: "Empty response".to_string(),
            });
        }
        Ok(response[0])
    }

    /// Read four bytes (little-endian) from a register
    pub fn read_u32(&mut self, id: u8, register: Register) -> Result<u32> {
        let addr = (register as u16).to_le_bytes();
        let params = [addr[0], addr[1], 4, 0]; // address, length
        let packet = Self::build_packet(id, Instruction::Read, &params);
        self.send_packet(&packet)?;

        let response = self.read_response(id)?;
        if response.len() < 4 {
            return Err(BusError::InvalidResponse {
                id,
                reason: format!("Expected 4 bytes, got {}", response.len()),
            });
        }
        Ok(u32::from_le_bytes([
            response[0],
            response[1],
            response[2],
            response[3],
        ]))
    }

    /// Sync write: write the same register on multiple servos in one packet
    /// data: [(id, value), ...]
    pub fn sync_write_i32(&mut self, register: Register, data: &[(u8, i32)]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        // Sync write format:
        // [addr_lo, addr_hi, len_lo, len_hi, id1, data1..., id2, data2..., ...]
        let addr = (register as u16).to_le_bytes();
        let data_length: u16 = 4; // 4 bytes per servo
        let mut params = vec![addr[0], addr[1]];
        params.extend_from_slice(&data_length.to_le_bytes());

        for &(id, value) in data {
            params.push(id);
            params.extend_from_slice(&(value as u32).to_le_bytes());
        }

        let packet = Self::build_packet(BROADCAST_ID, Instruction::SyncWrite, &params);
        debug!("Sync write to {} joints: reg={:?}", data.len(), register);
        self.send_packet(&packet)?;

        // Sync write has no response
        Ok(())
    }

    // === High-level convenience methods ===

    /// Enable torque on a servo
    pub fn enable_torque(&mut self, id: u8) -> Result<()> {
        self.write_u8(id, Register::TorqueEnable, 1)
    }

    /// Disable torque on a servo
    pub fn disable_torque(&mut self, id: u8) -> Result<()> {
        self.write_u8(id, Register::TorqueEnable, 0)
    }

    /// Set operating mode (must disable torque first)
    pub fn set_operating_mode(&mut self, id: u8, mode: OperatingMode) -> Result<()> {
        self.write_u8(id, Register::OperatingMode, mode as u8)
    }

    /// Set goal velocity for a servo (must be in velocity mode)
    pub fn set_velocity(&mut self, id: u8, velocity: i32) -> Result<()> {
        self.write_i32(id, Register::GoalVelocity, velocity)
    }

    /// Read present velocity from a servo
    pub fn get_velocity(&mut self, id: u8) -> Result<i32> {
        Ok(self.read_u32(id, Register::PresentVelocity)? as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_ping_vector() {
        // CRC over the ping instruction packet for ID 1, minus the CRC
        // field itself
        let data = [0xFFu8, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01];
        assert_eq!(Xl330Bus::crc16(&data), 0x4E19);
    }

    #[test]
    fn test_build_ping_packet() {
        let packet = Xl330Bus::build_packet(1, Instruction::Ping, &[]);
        assert_eq!(
            packet,
            vec![0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]
        );
    }

    #[test]
    fn test_build_write_packet_layout() {
        // Goal velocity write: 2-byte address + 4-byte value
        let addr = (Register::GoalVelocity as u16).to_le_bytes();
        let value = 200i32.to_le_bytes();
        let params = [addr[0], addr[1], value[0], value[1], value[2], value[3]];
        let packet = Xl330Bus::build_packet(2, Instruction::Write, &params);

        assert_eq!(&packet[..4], &[0xFF, 0xFF, 0xFD, 0x00]);
        assert_eq!(packet[4], 2); // ID
        assert_eq!(u16::from_le_bytes([packet[5], packet[6]]), 9); // params + 3
        assert_eq!(packet[7], 0x03); // WRITE instruction
        assert_eq!(packet[8], 104); // GoalVelocity address low byte
        assert_eq!(packet.len(), 7 + 9);
    }

    #[test]
    fn test_negative_velocity_is_twos_complement() {
        let value = (-300i32 as u32).to_le_bytes();
        assert_eq!(value, [0xD4, 0xFE, 0xFF, 0xFF]);
    }

    #[test]
    fn test_sync_write_params_layout() {
        // Reconstruct the params a two-joint velocity sync write produces
        let data = [(1u8, 100i32), (2u8, -100i32)];
        let addr = (Register::GoalVelocity as u16).to_le_bytes();
        let mut params = vec![addr[0], addr[1], 4, 0];
        for &(id, value) in &data {
            params.push(id);
            params.extend_from_slice(&(value as u32).to_le_bytes());
        }
        let packet = Xl330Bus::build_packet(BROADCAST_ID, Instruction::SyncWrite, &params);

        assert_eq!(packet[4], 0xFE);
        assert_eq!(packet[7], 0x83);
        // 4 fixed bytes + 2 * (1 id + 4 data), then + 3 for instr/crc
        assert_eq!(u16::from_le_bytes([packet[5], packet[6]]), 14 + 3);
    }
}
