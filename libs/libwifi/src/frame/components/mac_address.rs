use std::fmt;

/// This is our representation of a MAC-address
///
/// ```
/// use libwifi::frame::components::MacAddress;
///
/// let address = MacAddress([255, 255, 255, 255, 255, 255]);
/// assert!(address.is_broadcast());
/// assert!(address.is_group());
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Copy, Ord, PartialOrd, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn broadcast() -> Self {
        MacAddress([255, 255, 255, 255, 255, 255])
    }

    pub fn zeroed() -> Self {
        MacAddress([0, 0, 0, 0, 0, 0])
    }

    /// A locally administered unicast address, handy for simulated nodes.
    pub fn local(index: u32) -> Self {
        let [a, b, c, d] = index.to_be_bytes();
        MacAddress([0x02, 0x00, a, b, c, d])
    }

    /// Encode mac address for network.
    pub fn encode(&self) -> [u8; 6] {
        self.0
    }

    /// Check if this is a private address (locally set bit)
    pub fn is_private(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Check whether the individual/group bit is set.
    /// The broadcast address is a group address as well.
    pub fn is_group(&self) -> bool {
        self.0[0] & 0x01 == 1
    }

    /// Check whether this MAC addresses the whole network.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [255, 255, 255, 255, 255, 255]
    }

    /// Generate string with delimitters.
    pub fn to_long_string(&self) -> String {
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MacParseError {
    InvalidDigit,
    InvalidLength,
}

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacParseError::InvalidDigit => write!(f, "Invalid hex digit in mac address"),
            MacParseError::InvalidLength => write!(f, "A mac address has exactly six octets"),
        }
    }
}

impl std::error::Error for MacParseError {}

impl std::str::FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut array = [0u8; 6];

        let input_lower = input.to_lowercase();
        let bytes: Vec<&str> = if input_lower.contains(':') {
            input_lower.split(':').collect()
        } else if input_lower.contains('-') {
            input_lower.split('-').collect()
        } else if input_lower.len() == 12 && input_lower.is_ascii() {
            input_lower
                .as_bytes()
                .chunks(2)
                .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
                .collect()
        } else {
            return Err(MacParseError::InvalidLength);
        };

        if bytes.len() != 6 {
            return Err(MacParseError::InvalidLength);
        }

        for (count, byte) in bytes.iter().enumerate() {
            array[count] = u8::from_str_radix(byte, 16).map_err(|_| MacParseError::InvalidDigit)?;
        }

        Ok(MacAddress(array))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_broadcast() {
        let mac = MacAddress([255, 255, 255, 255, 255, 255]);
        assert!(mac.is_broadcast());
        assert!(mac.is_group());
    }

    #[test]
    fn test_group_bit() {
        assert!(MacAddress([0x01, 0x00, 0x5e, 0, 0, 1]).is_group());
        assert!(!MacAddress::local(7).is_group());
        assert!(MacAddress::local(7).is_private());
    }

    #[test]
    fn test_format() {
        let mac = MacAddress([12, 157, 146, 197, 170, 127]);
        assert_eq!("0c:9d:92:c5:aa:7f", mac.to_string());
        assert_eq!("0C:9D:92:C5:AA:7F", mac.to_long_string());
    }

    #[test]
    fn test_parse() {
        let expected = MacAddress([12, 157, 146, 197, 170, 127]);
        assert_eq!("0c:9d:92:c5:aa:7f".parse::<MacAddress>(), Ok(expected));
        assert_eq!("0C-9D-92-C5-AA-7F".parse::<MacAddress>(), Ok(expected));
        assert_eq!("0c9d92c5aa7f".parse::<MacAddress>(), Ok(expected));
        assert_eq!(
            "0c:9d:92".parse::<MacAddress>(),
            Err(MacParseError::InvalidLength)
        );
        assert_eq!(
            "zz:9d:92:c5:aa:7f".parse::<MacAddress>(),
            Err(MacParseError::InvalidDigit)
        );
    }

    #[test]
    fn test_hash_distinguishes_addresses() {
        let set: HashSet<MacAddress> = (0..16).map(MacAddress::local).collect();
        assert_eq!(set.len(), 16);
    }
}
