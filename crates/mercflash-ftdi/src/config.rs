//! Connection settings and programmer option parsing

use crate::error::{FtdiError, Result};

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;

/// FT232R product ID, as fitted to the Mercury board
pub const FTDI_FT232R_PID: u16 = 0x6001;

/// USB product string of the Mercury board
pub const MERCURY_DESCRIPTION: &str = "Mercury FPGA";

/// Bit-bang clock used by the stock programmer
pub const DEFAULT_BAUD_RATE: u32 = 3_000_000;

/// FTDI channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FtdiInterface {
    /// Channel A (default, the only one on an FT232R)
    #[default]
    A,
    /// Channel B
    B,
    /// Channel C
    C,
    /// Channel D
    D,
}

impl FtdiInterface {
    /// Parse interface from character
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(FtdiInterface::A),
            'B' => Some(FtdiInterface::B),
            'C' => Some(FtdiInterface::C),
            'D' => Some(FtdiInterface::D),
            _ => None,
        }
    }

    /// Get the channel letter
    pub fn letter(&self) -> char {
        match self {
            FtdiInterface::A => 'A',
            FtdiInterface::B => 'B',
            FtdiInterface::C => 'C',
            FtdiInterface::D => 'D',
        }
    }
}

/// Configuration for opening the Mercury board's FTDI chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtdiConfig {
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
    /// Channel to use
    pub interface: FtdiInterface,
    /// Bit-bang clock rate
    pub baud_rate: u32,
    /// USB product string the board must report; `None` accepts any
    pub description: Option<String>,
}

impl FtdiConfig {
    /// Whether a device reporting `product` is the board we were asked for
    pub fn accepts_product(&self, product: &str) -> bool {
        match &self.description {
            Some(expected) => product.trim() == expected.as_str(),
            None => true,
        }
    }
}

impl Default for FtdiConfig {
    fn default() -> Self {
        FtdiConfig {
            vendor_id: FTDI_VID,
            product_id: FTDI_FT232R_PID,
            interface: FtdiInterface::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            description: Some(MERCURY_DESCRIPTION.to_string()),
        }
    }
}

fn parse_hex_u16(key: &str, value: &str) -> Result<u16> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16)
        .map_err(|_| FtdiError::InvalidParameter(format!("Invalid {} '{}'", key, value)))
}

/// Parse programmer options
///
/// Format: "baud=<N>,interface=<A|B|C|D>,vid=<hex>,pid=<hex>,description=<text>"
///
/// `description=*` (or an empty description) accepts any product string.
pub fn parse_options(options: &[(&str, &str)]) -> Result<FtdiConfig> {
    let mut config = FtdiConfig::default();

    for (key, value) in options {
        match *key {
            "baud" | "baudrate" => {
                let baud: u32 = value.parse().map_err(|_| {
                    FtdiError::InvalidParameter(format!("Invalid baud rate '{}'", value))
                })?;
                if baud == 0 {
                    return Err(FtdiError::InvalidParameter(
                        "Baud rate must be non-zero".to_string(),
                    ));
                }
                config.baud_rate = baud;
            }
            "interface" | "port" => {
                let mut chars = value.chars();
                config.interface = match (chars.next(), chars.next()) {
                    (Some(c), None) => FtdiInterface::from_char(c),
                    _ => None,
                }
                .ok_or_else(|| FtdiError::InvalidChannel(value.to_string()))?;
            }
            "vid" => config.vendor_id = parse_hex_u16(key, value)?,
            "pid" => config.product_id = parse_hex_u16(key, value)?,
            "description" | "desc" => {
                config.description = match *value {
                    "" | "*" => None,
                    text => Some(text.to_string()),
                };
            }
            _ => {
                log::warn!("ftdi: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.vendor_id, 0x0403);
        assert_eq!(config.product_id, 0x6001);
        assert_eq!(config.interface, FtdiInterface::A);
        assert_eq!(config.baud_rate, 3_000_000);
        assert_eq!(config.description.as_deref(), Some("Mercury FPGA"));
    }

    #[test]
    fn test_description_option() {
        let config = parse_options(&[("description", "My Board")]).unwrap();
        assert_eq!(config.description.as_deref(), Some("My Board"));
        assert!(config.accepts_product("My Board"));
        assert!(!config.accepts_product("Mercury FPGA"));

        let config = parse_options(&[("desc", "*")]).unwrap();
        assert_eq!(config.description, None);
        assert!(config.accepts_product("FT232R USB UART"));
    }

    #[test]
    fn test_default_rejects_other_ftdi_devices() {
        let config = FtdiConfig::default();
        assert!(config.accepts_product("Mercury FPGA"));
        assert!(!config.accepts_product("FT232R USB UART"));
        assert!(!config.accepts_product(""));
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("baud", "1000000"), ("interface", "b"), ("pid", "0x6010")])
            .unwrap();
        assert_eq!(config.baud_rate, 1_000_000);
        assert_eq!(config.interface, FtdiInterface::B);
        assert_eq!(config.product_id, 0x6010);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(
            parse_options(&[("interface", "AB")]),
            Err(FtdiError::InvalidChannel(_))
        ));
        assert!(matches!(
            parse_options(&[("interface", "E")]),
            Err(FtdiError::InvalidChannel(_))
        ));
        assert!(matches!(
            parse_options(&[("baud", "fast")]),
            Err(FtdiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("baud", "0")]),
            Err(FtdiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("vid", "xyz")]),
            Err(FtdiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unknown_option_ignored() {
        assert_eq!(
            parse_options(&[("color", "blue")]).unwrap(),
            FtdiConfig::default()
        );
    }
}
