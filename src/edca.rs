use std::time::Duration;

use libwifi::frame::components::{AcParameterRecord, EdcaParameterElement};
use strum_macros::Display;

/// Long slot time, DSSS compatible.
pub const LONG_SLOT: Duration = Duration::from_micros(20);
/// Short slot time, ERP only.
pub const SHORT_SLOT: Duration = Duration::from_micros(9);

/// TXOP limits travel in units of 32 µs.
const TXOP_UNIT_US: u128 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum AccessCategory {
    #[strum(serialize = "AC_BE")]
    BestEffort,
    #[strum(serialize = "AC_BK")]
    Background,
    #[strum(serialize = "AC_VI")]
    Video,
    #[strum(serialize = "AC_VO")]
    Voice,
}

impl AccessCategory {
    /// Element order of the EDCA parameter set.
    pub const ALL: [AccessCategory; 4] = [
        AccessCategory::BestEffort,
        AccessCategory::Background,
        AccessCategory::Video,
        AccessCategory::Voice,
    ];

    /// User priority to access category, per 802.1D.
    /// Anything above 7 carries no valid priority and is treated as best effort.
    pub fn from_tid(tid: u8) -> Self {
        match tid {
            1 | 2 => AccessCategory::Background,
            4 | 5 => AccessCategory::Video,
            6 | 7 => AccessCategory::Voice,
            _ => AccessCategory::BestEffort,
        }
    }

    pub fn aci(&self) -> u8 {
        match self {
            AccessCategory::BestEffort => 0,
            AccessCategory::Background => 1,
            AccessCategory::Video => 2,
            AccessCategory::Voice => 3,
        }
    }

    pub fn from_aci(aci: u8) -> Self {
        match aci & 0b11 {
            0 => AccessCategory::BestEffort,
            1 => AccessCategory::Background,
            2 => AccessCategory::Video,
            _ => AccessCategory::Voice,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdcaParameters {
    pub cw_min: u16,
    pub cw_max: u16,
    pub aifsn: u8,
    pub txop_limit: Duration,
}

impl EdcaParameters {
    fn to_record(self, category: AccessCategory) -> AcParameterRecord {
        AcParameterRecord {
            aci: category.aci(),
            acm: false,
            aifsn: self.aifsn,
            ecw_min: cw_to_ecw(self.cw_min),
            ecw_max: cw_to_ecw(self.cw_max),
            txop_limit: (self.txop_limit.as_micros() / TXOP_UNIT_US) as u16,
        }
    }

    fn from_record(record: &AcParameterRecord) -> Self {
        EdcaParameters {
            cw_min: ecw_to_cw(record.ecw_min),
            cw_max: ecw_to_cw(record.ecw_max),
            aifsn: record.aifsn,
            txop_limit: Duration::from_micros(record.txop_limit as u64 * TXOP_UNIT_US as u64),
        }
    }
}

/// Smallest exponent whose window `2^ecw - 1` covers `cw`.
fn cw_to_ecw(cw: u16) -> u8 {
    let ecw = (cw as u32 + 1).next_power_of_two().trailing_zeros();
    ecw.min(15) as u8
}

fn ecw_to_cw(ecw: u8) -> u16 {
    ((1u32 << ecw.min(15)) - 1) as u16
}

/// The four access category records an access point announces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdcaParameterSet {
    pub best_effort: EdcaParameters,
    pub background: EdcaParameters,
    pub video: EdcaParameters,
    pub voice: EdcaParameters,
}

impl EdcaParameterSet {
    /// Defaults derived from the DCF contention window.
    ///
    /// VI and VO shrink the window, their TXOP limits depend on whether the PHY is DSSS only.
    pub fn with_contention_window(cw_min: u16, cw_max: u16, dsss_only: bool) -> Self {
        let (video_txop, voice_txop) = if dsss_only {
            (Duration::from_micros(6016), Duration::from_micros(3264))
        } else {
            (Duration::from_micros(3008), Duration::from_micros(1504))
        };

        EdcaParameterSet {
            best_effort: EdcaParameters {
                cw_min,
                cw_max,
                aifsn: 3,
                txop_limit: Duration::ZERO,
            },
            background: EdcaParameters {
                cw_min,
                cw_max,
                aifsn: 7,
                txop_limit: Duration::ZERO,
            },
            video: EdcaParameters {
                cw_min: (cw_min + 1) / 2 - 1,
                cw_max: cw_min,
                aifsn: 2,
                txop_limit: video_txop,
            },
            voice: EdcaParameters {
                cw_min: (cw_min + 1) / 4 - 1,
                cw_max: (cw_min + 1) / 2 - 1,
                aifsn: 2,
                txop_limit: voice_txop,
            },
        }
    }

    pub fn get(&self, category: AccessCategory) -> &EdcaParameters {
        match category {
            AccessCategory::BestEffort => &self.best_effort,
            AccessCategory::Background => &self.background,
            AccessCategory::Video => &self.video,
            AccessCategory::Voice => &self.voice,
        }
    }

    pub fn set(&mut self, category: AccessCategory, parameters: EdcaParameters) {
        match category {
            AccessCategory::BestEffort => self.best_effort = parameters,
            AccessCategory::Background => self.background = parameters,
            AccessCategory::Video => self.video = parameters,
            AccessCategory::Voice => self.voice = parameters,
        }
    }

    pub fn to_element(&self) -> EdcaParameterElement {
        let mut element = EdcaParameterElement::default();
        for (record, category) in element.records.iter_mut().zip(AccessCategory::ALL) {
            *record = self.get(category).to_record(category);
        }
        element
    }

    /// Records are matched by their ACI, not by position.
    pub fn from_element(element: &EdcaParameterElement) -> Self {
        let mut set = EdcaParameterSet::default();
        for record in &element.records {
            set.set(
                AccessCategory::from_aci(record.aci),
                EdcaParameters::from_record(record),
            );
        }
        set
    }
}

impl Default for EdcaParameterSet {
    fn default() -> Self {
        EdcaParameterSet::with_contention_window(15, 1023, false)
    }
}

/// Channel access parameters currently in force on a MAC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkParameters {
    pub slot: Duration,
    pub short_preamble: bool,
    pub short_slot: bool,
    pub use_protection: bool,
    pub cw_min: u16,
    pub cw_max: u16,
    pub edca: EdcaParameterSet,
}

impl LinkParameters {
    /// Starting point before anything was learned from an access point.
    pub fn initial(dsss_only: bool) -> Self {
        let cw_min = if dsss_only { 31 } else { 15 };
        LinkParameters {
            slot: if dsss_only { LONG_SLOT } else { SHORT_SLOT },
            short_preamble: false,
            short_slot: false,
            use_protection: false,
            cw_min,
            cw_max: 1023,
            edca: EdcaParameterSet::with_contention_window(cw_min, 1023, dsss_only),
        }
    }

    /// Reconfigures the DCF window and the EDCA records derived from it.
    pub fn configure_contention_window(&mut self, cw_min: u16, cw_max: u16, dsss_only: bool) {
        self.cw_min = cw_min;
        self.cw_max = cw_max;
        self.edca = EdcaParameterSet::with_contention_window(cw_min, cw_max, dsss_only);
    }
}
