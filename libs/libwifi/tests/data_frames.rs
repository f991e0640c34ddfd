use libwifi::frame::components::*;
use libwifi::frame::*;
use libwifi::{append_fcs, parse_frame, Addresses, FrameSubType};

#[test]
fn test_data() {
    let payload = [
        8, 98, // FrameControl
        0, 0, // Duration id
        51, 51, 255, 75, 207, 58, // First address
        248, 50, 228, 173, 71, 184, // Second address
        192, 238, 251, 75, 207, 58, // Third address
        80, 2, // SequencControl
        // The rest is data
        90, 7, 0, 96, 0, 0, 0, 0, 239, 46, 109, 235, 61, 58, 89, 37, 181, 238, 23, 98, 108, 29, 99,
        170, 28, 132, 136, 248, 109, 194, 64, 139, 35, 219, 22, 195, 40, 100, 32, 6, 7, 230, 5,
    ];

    let frame = parse_frame(&payload, false).expect("Payload should be valid");
    let Frame::Data(data) = &frame else {
        panic!("Expected a data frame, got {frame:?}");
    };
    assert!(data.header.frame_control.from_ds());
    assert!(!data.header.frame_control.to_ds());
    assert_eq!(data.data.len(), payload.len() - 24);

    // From the distribution system: address 2 is the BSSID, address 3 the source.
    assert_eq!(
        frame.bssid(),
        Some(&MacAddress([248, 50, 228, 173, 71, 184]))
    );
    assert_eq!(frame.src(), Some(&MacAddress([192, 238, 251, 75, 207, 58])));
    assert_eq!(frame.encode().unwrap(), payload.to_vec());
}

#[test]
fn test_null_data() {
    let payload = [
        72, 17, //
        60, 0, //
        156, 128, 223, 131, 16, 180, //
        252, 25, 16, 16, 128, 171, //
        156, 128, 223, 131, 16, 180, 128, 43,
    ];

    let frame = parse_frame(&payload, false).expect("Payload should be valid");
    assert!(matches!(frame, Frame::NullData(_)));
    assert_eq!(frame.encode().unwrap(), payload.to_vec());
}

#[test]
fn test_qos_data() {
    let payload = [
        136, 66, // Frame Control
        44, 0, // Duration Id
        192, 238, 251, 75, 207, 58, // Address 1
        248, 50, 228, 173, 71, 184, // Address 2
        248, 50, 228, 173, 71, 184, // Address 3
        64, 119, // SequencControl
        6, 0, // QoS
        // The rest is data
        163, 23, 0, 32, 2, 0, 0, 0, 210, 141, 170, 200, 6, 91, 65, 22, 251, 155, 224, 22, 110, 76,
    ];
    let frame = parse_frame(&payload, false).expect("Payload should be valid");
    let Frame::QosData(qos_data) = frame else {
        panic!("Expected a QoS data frame");
    };
    assert_eq!(qos_data.tid(), 6);
    assert!(!qos_data.is_amsdu());
    assert!(qos_data.subframes().is_err());
    assert_eq!(qos_data.data.len(), payload.len() - 26);
}

#[test]
fn test_qos_amsdu_with_fcs() {
    let access_point = MacAddress::local(100);
    let station = MacAddress::local(1);
    let subframes = vec![
        AmsduSubframe {
            destination: MacAddress::local(2),
            source: station,
            payload: b"first".to_vec(),
        },
        AmsduSubframe {
            destination: MacAddress::broadcast(),
            source: station,
            payload: b"second".to_vec(),
        },
    ];

    let frame = QosData {
        header: DataHeader {
            frame_control: FrameControl::new(FrameSubType::QosData, FrameControl::TO_DS),
            duration: [0, 0],
            address_1: access_point,
            address_2: station,
            address_3: access_point,
            sequence_control: SequenceControl::new(1),
            address_4: None,
            qos: Some(DataHeader::qos_control(5, true)),
        },
        data: encode_amsdu(&subframes).unwrap(),
    };

    let mut bytes = frame.encode();
    append_fcs(&mut bytes);

    let Frame::QosData(parsed) = parse_frame(&bytes, true).expect("Payload should be valid")
    else {
        panic!("Expected a QoS data frame");
    };
    assert_eq!(parsed.tid(), 5);
    assert!(parsed.is_amsdu());
    assert_eq!(parsed.subframes().expect("Valid aggregate"), subframes);
}

#[test]
fn test_four_address_frame() {
    let mut payload = vec![
        8, 3, // FrameControl, to_ds and from_ds
        0, 0, // Duration
        2, 0, 0, 0, 0, 1, // Receiver
        2, 0, 0, 0, 0, 2, // Transmitter
        2, 0, 0, 0, 0, 3, // Destination
        0, 0, // SequenceControl
        2, 0, 0, 0, 0, 4, // Source
    ];
    payload.extend_from_slice(&[1, 2, 3]);

    let frame = parse_frame(&payload, false).expect("Payload should be valid");
    assert_eq!(frame.src(), Some(&MacAddress([2, 0, 0, 0, 0, 4])));
    assert_eq!(frame.dest(), &MacAddress([2, 0, 0, 0, 0, 3]));
    assert_eq!(frame.bssid(), None);

    // The fourth address is mandatory in that case.
    payload.truncate(26);
    assert!(parse_frame(&payload, false).is_err());
}
