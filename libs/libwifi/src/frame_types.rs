use strum_macros::Display;

/// Enum with all frame types.
/// The discriminant is the two-bit value used on the wire.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum FrameType {
    Management = 0,
    Control = 1,
    Data = 2,
    Unknown = 3,
}

/// Enum with all frame subtypes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum FrameSubType {
    // Management subtypes
    AssociationRequest,
    AssociationResponse,
    ReassociationRequest,
    ReassociationResponse,
    ProbeRequest,
    ProbeResponse,
    TimingAdvertisement,
    Beacon,
    Atim,
    Disassociation,
    Authentication,
    Deauthentication,
    Action,
    ActionNoAck,

    // Control subtypes
    Trigger,
    Tack,
    BeamformingReportPoll,
    NdpAnnouncement,
    ControlFrameExtension,
    ControlWrapper,
    BlockAckRequest,
    BlockAck,
    PsPoll,
    Rts,
    Cts,
    Ack,
    CfEnd,
    CfEndCfAck,

    // Data subtypes
    Data,
    DataCfAck,
    DataCfPoll,
    DataCfAckCfPoll,
    NullData,
    CfAck,
    CfPoll,
    CfAckCfPoll,
    QosData,
    QosDataCfAck,
    QosDataCfPoll,
    QosDataCfAckCfPoll,
    QosNull,
    QosCfPoll,
    QosCfAckCfPoll,

    // Special subtypes
    Reserved,
    Unhandled,
}

impl FrameSubType {
    pub fn is_qos(&self) -> bool {
        matches!(
            self,
            FrameSubType::QosData
                | FrameSubType::QosDataCfAck
                | FrameSubType::QosDataCfPoll
                | FrameSubType::QosDataCfAckCfPoll
                | FrameSubType::QosNull
                | FrameSubType::QosCfPoll
                | FrameSubType::QosCfAckCfPoll,
        )
    }

    /// The frame type this subtype belongs to.
    pub fn frame_type(&self) -> FrameType {
        use FrameSubType::*;
        match self {
            AssociationRequest | AssociationResponse | ReassociationRequest
            | ReassociationResponse | ProbeRequest | ProbeResponse | TimingAdvertisement
            | Beacon | Atim | Disassociation | Authentication | Deauthentication | Action
            | ActionNoAck => FrameType::Management,
            Trigger | Tack | BeamformingReportPoll | NdpAnnouncement | ControlFrameExtension
            | ControlWrapper | BlockAckRequest | BlockAck | PsPoll | Rts | Cts | Ack | CfEnd
            | CfEndCfAck => FrameType::Control,
            Data | DataCfAck | DataCfPoll | DataCfAckCfPoll | NullData | CfAck | CfPoll
            | CfAckCfPoll | QosData | QosDataCfAck | QosDataCfPoll | QosDataCfAckCfPoll
            | QosNull | QosCfPoll | QosCfAckCfPoll => FrameType::Data,
            Reserved | Unhandled => FrameType::Unknown,
        }
    }

    /// The four-bit subtype value used on the wire.
    pub fn to_bytes(&self) -> u8 {
        use FrameSubType::*;
        match self {
            AssociationRequest => 0,
            AssociationResponse => 1,
            ReassociationRequest => 2,
            ReassociationResponse => 3,
            ProbeRequest => 4,
            ProbeResponse => 5,
            TimingAdvertisement => 6,
            Beacon => 8,
            Atim => 9,
            Disassociation => 10,
            Authentication => 11,
            Deauthentication => 12,
            Action => 13,
            ActionNoAck => 14,

            Trigger => 2,
            Tack => 3,
            BeamformingReportPoll => 4,
            NdpAnnouncement => 5,
            ControlFrameExtension => 6,
            ControlWrapper => 7,
            BlockAckRequest => 8,
            BlockAck => 9,
            PsPoll => 10,
            Rts => 11,
            Cts => 12,
            Ack => 13,
            CfEnd => 14,
            CfEndCfAck => 15,

            Data => 0,
            DataCfAck => 1,
            DataCfPoll => 2,
            DataCfAckCfPoll => 3,
            NullData => 4,
            CfAck => 5,
            CfPoll => 6,
            CfAckCfPoll => 7,
            QosData => 8,
            QosDataCfAck => 9,
            QosDataCfPoll => 10,
            QosDataCfAckCfPoll => 11,
            QosNull => 12,
            QosCfPoll => 14,
            QosCfAckCfPoll => 15,

            Reserved | Unhandled => 15,
        }
    }
}
