use crate::error::Error;

use super::elements::{
    element_id, EdcaParameterElement, ErpInformation, HtCapabilities, HtOperation,
    VhtCapabilities,
};

/// Maximum number of rates carried by the supported rates element.
/// Anything beyond spills into the extended supported rates element.
const MAX_SUPPORTED_RATES: usize = 8;

/// Longest SSID a network may announce, in bytes.
pub const MAX_SSID_LENGTH: usize = 32;

#[derive(Clone, Debug, Default, PartialEq)]
/// StationInfo is used to parse and store the variable length information elements that are
/// sent with management frames.
///
/// Each element has an `id`, the length of its body and then the body itself.
/// All elements that take part in association get their own typed field, the bytes of all
/// other elements are saved in `data` under their respective element id.
pub struct StationInfo {
    pub ssid: Option<String>,
    pub supported_rates: Vec<SupportedRate>,
    pub extended_supported_rates: Option<Vec<SupportedRate>>,
    pub ds_parameter_set: Option<u8>,
    pub edca_parameter_set: Option<EdcaParameterElement>,
    pub erp_information: Option<ErpInformation>,
    pub ht_capabilities: Option<HtCapabilities>,
    pub ht_operation: Option<HtOperation>,
    pub vht_capabilities: Option<VhtCapabilities>,
    pub data: Vec<(u8, Vec<u8>)>,
}

impl StationInfo {
    /// Encode all elements in their canonical order.
    ///
    /// Fails on an SSID longer than [MAX_SSID_LENGTH] or an element body that doesn't fit the
    /// one byte length field.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();

        if let Some(ssid) = &self.ssid {
            if ssid.len() > MAX_SSID_LENGTH {
                return Err(Error::InvalidElement {
                    id: element_id::SSID,
                    reason: format!("SSID of {} bytes exceeds {MAX_SSID_LENGTH}", ssid.len()),
                });
            }
            push_element(&mut bytes, element_id::SSID, ssid.as_bytes())?;
        }

        if !self.supported_rates.is_empty() {
            let rates: Vec<u8> = self.supported_rates.iter().map(|r| r.encode()).collect();
            push_element(&mut bytes, element_id::SUPPORTED_RATES, &rates)?;
        }

        if let Some(channel) = self.ds_parameter_set {
            push_element(&mut bytes, element_id::DSSS_PARAMETER_SET, &[channel])?;
        }

        if let Some(erp) = &self.erp_information {
            push_element(&mut bytes, element_id::ERP_INFORMATION, &erp.encode())?;
        }

        if let Some(ht_capabilities) = &self.ht_capabilities {
            push_element(
                &mut bytes,
                element_id::HT_CAPABILITIES,
                &ht_capabilities.encode(),
            )?;
        }

        if let Some(ext_rates) = &self.extended_supported_rates {
            let rates: Vec<u8> = ext_rates.iter().map(|r| r.encode()).collect();
            push_element(&mut bytes, element_id::EXTENDED_SUPPORTED_RATES, &rates)?;
        }

        if let Some(ht_operation) = &self.ht_operation {
            push_element(&mut bytes, element_id::HT_OPERATION, &ht_operation.encode())?;
        }

        if let Some(edca) = &self.edca_parameter_set {
            push_element(&mut bytes, element_id::EDCA_PARAMETER_SET, &edca.encode())?;
        }

        if let Some(vht_capabilities) = &self.vht_capabilities {
            push_element(
                &mut bytes,
                element_id::VHT_CAPABILITIES,
                &vht_capabilities.encode(),
            )?;
        }

        for (id, data) in &self.data {
            push_element(&mut bytes, *id, data)?;
        }

        Ok(bytes)
    }

    /// The SSID, an empty string for the wildcard SSID or a missing element.
    pub fn ssid(&self) -> &str {
        self.ssid.as_deref().unwrap_or("")
    }

    /// Supported and extended supported rates in advertised order.
    pub fn rates(&self) -> impl Iterator<Item = &SupportedRate> {
        self.supported_rates
            .iter()
            .chain(self.extended_supported_rates.iter().flatten())
    }

    /// Store a rate list, splitting it over the supported and extended rates elements.
    pub fn set_rates(&mut self, mut rates: Vec<SupportedRate>) {
        if rates.len() > MAX_SUPPORTED_RATES {
            let extended = rates.split_off(MAX_SUPPORTED_RATES);
            self.extended_supported_rates = Some(extended);
        } else {
            self.extended_supported_rates = None;
        }
        self.supported_rates = rates;
    }
}

fn push_element(bytes: &mut Vec<u8>, id: u8, body: &[u8]) -> Result<(), Error> {
    let length = u8::try_from(body.len()).map_err(|_| Error::InvalidElement {
        id,
        reason: format!("body of {} bytes exceeds 255", body.len()),
    })?;
    bytes.push(id);
    bytes.push(length);
    bytes.extend_from_slice(body);
    Ok(())
}

/// A single entry of the (extended) supported rates element.
///
/// `rate` is given in units of 500 kbit/s. The MSB on the wire flags a basic rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SupportedRate {
    pub basic: bool,
    pub rate: u8,
}

impl SupportedRate {
    pub fn from_byte(byte: u8) -> Self {
        SupportedRate {
            basic: byte & 0x80 != 0,
            rate: byte & 0x7F,
        }
    }

    pub fn encode(&self) -> u8 {
        if self.basic {
            self.rate | 0x80
        } else {
            self.rate & 0x7F
        }
    }

    pub fn mbps(&self) -> f32 {
        self.rate as f32 / 2.0
    }
}
