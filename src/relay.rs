//! Routing of data frames an access point receives from its stations.

use libwifi::frame::components::MacAddress;
use libwifi::{Frame, Header};

use crate::error::MacError;
use crate::registry::StationRegistry;

/// Where one received payload has to go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayAction {
    /// Hand the payload to the upper layer.
    ForwardUp {
        payload: Vec<u8>,
        source: MacAddress,
        destination: MacAddress,
    },
    /// Send the payload back into the BSS, keeping the priority it arrived with.
    ForwardDown {
        payload: Vec<u8>,
        source: MacAddress,
        destination: MacAddress,
        tid: Option<u8>,
    },
}

/// Routes a single payload.
///
/// Group destinations go both ways, associated stations only down. Everything else passed
/// admission already and goes up.
pub fn route(
    own: &MacAddress,
    registry: &StationRegistry,
    source: MacAddress,
    destination: MacAddress,
    payload: Vec<u8>,
    tid: Option<u8>,
) -> Vec<RelayAction> {
    if destination == *own {
        return vec![RelayAction::ForwardUp {
            payload,
            source,
            destination,
        }];
    }

    if destination.is_group() {
        return vec![
            RelayAction::ForwardDown {
                payload: payload.clone(),
                source,
                destination,
                tid,
            },
            RelayAction::ForwardUp {
                payload,
                source,
                destination,
            },
        ];
    }

    if registry.is_associated(&destination) {
        log::debug!("relaying {} -> {}", source, destination);
        return vec![RelayAction::ForwardDown {
            payload,
            source,
            destination,
            tid,
        }];
    }

    vec![RelayAction::ForwardUp {
        payload,
        source,
        destination,
    }]
}

/// Routes an admitted to-DS data frame. A-MSDUs are split first, every sub-frame keeps the
/// TID of the aggregate.
pub fn relay_frame(
    own: &MacAddress,
    registry: &StationRegistry,
    frame: Frame,
) -> Result<Vec<RelayAction>, MacError> {
    let source = *frame.address_2();
    let destination = *frame.address_3();

    let actions = match frame {
        Frame::QosData(data) if data.is_amsdu() => {
            let tid = Some(data.tid());
            let mut actions = Vec::new();
            for subframe in data.subframes()? {
                actions.extend(route(
                    own,
                    registry,
                    subframe.source,
                    subframe.destination,
                    subframe.payload,
                    tid,
                ));
            }
            actions
        }
        Frame::QosData(data) => {
            let tid = Some(data.tid());
            route(own, registry, source, destination, data.data, tid)
        }
        Frame::Data(data) => route(own, registry, source, destination, data.data, None),
        // Null frames carry nothing to relay
        _ => Vec::new(),
    };
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::test_support::frame;
    use crate::negotiation::{PeerCapabilities, StationClass};
    use crate::registry::{AssociationStatus, StationRecord};
    use crate::tx::{build_data, DataAddressing};
    use libwifi::frame::components::FrameControl;
    use libwifi::frame::{encode_amsdu, AmsduSubframe};

    fn registry_with(stations: &[(u32, AssociationStatus)]) -> StationRegistry {
        let mut registry = StationRegistry::new();
        for (index, status) in stations {
            registry.add(StationRecord {
                address: MacAddress::local(*index),
                aid: *index as u16,
                capabilities: PeerCapabilities::default(),
                class: StationClass::default(),
                status: *status,
            });
        }
        registry
    }

    fn to_ap(source: MacAddress, destination: MacAddress, tid: Option<u8>, body: Vec<u8>, amsdu: bool) -> Frame {
        let addressing = DataAddressing {
            receiver: MacAddress::local(1),
            transmitter: source,
            address_3: destination,
            ds_flags: FrameControl::TO_DS,
        };
        frame(&build_data(addressing, 0, tid, amsdu, body))
    }

    #[test]
    fn test_route_rules() {
        let ap = MacAddress::local(1);
        let a = MacAddress::local(2);
        let registry = registry_with(&[
            (3, AssociationStatus::Associated),
            (4, AssociationStatus::WaitAssocTxOk),
        ]);

        let up = route(&ap, &registry, a, ap, vec![1], None);
        assert!(matches!(up[..], [RelayAction::ForwardUp { .. }]));

        let group = route(&ap, &registry, a, MacAddress::broadcast(), vec![1], Some(2));
        assert!(matches!(
            group[..],
            [
                RelayAction::ForwardDown { tid: Some(2), .. },
                RelayAction::ForwardUp { .. }
            ]
        ));

        let peer = route(&ap, &registry, a, MacAddress::local(3), vec![1], None);
        assert_eq!(
            peer,
            vec![RelayAction::ForwardDown {
                payload: vec![1],
                source: a,
                destination: MacAddress::local(3),
                tid: None,
            }]
        );

        // Not yet confirmed, so not a relay target.
        let pending = route(&ap, &registry, a, MacAddress::local(4), vec![1], None);
        assert!(matches!(pending[..], [RelayAction::ForwardUp { .. }]));

        let unknown = route(&ap, &registry, a, MacAddress::local(9), vec![1], None);
        assert!(matches!(unknown[..], [RelayAction::ForwardUp { .. }]));
    }

    #[test]
    fn test_amsdu_subframes_routed_independently() {
        let ap = MacAddress::local(1);
        let a = MacAddress::local(2);
        let b = MacAddress::local(3);
        let registry = registry_with(&[
            (2, AssociationStatus::Associated),
            (3, AssociationStatus::Associated),
        ]);

        let body = encode_amsdu(&[
            AmsduSubframe {
                destination: ap,
                source: a,
                payload: vec![0x01],
            },
            AmsduSubframe {
                destination: b,
                source: a,
                payload: vec![0x02, 0x02],
            },
            AmsduSubframe {
                destination: MacAddress::broadcast(),
                source: a,
                payload: vec![0x03; 3],
            },
        ])
        .unwrap();
        let actions = relay_frame(&ap, &registry, to_ap(a, ap, Some(6), body, true)).unwrap();

        assert_eq!(
            actions,
            vec![
                RelayAction::ForwardUp {
                    payload: vec![0x01],
                    source: a,
                    destination: ap,
                },
                RelayAction::ForwardDown {
                    payload: vec![0x02, 0x02],
                    source: a,
                    destination: b,
                    tid: Some(6),
                },
                RelayAction::ForwardDown {
                    payload: vec![0x03; 3],
                    source: a,
                    destination: MacAddress::broadcast(),
                    tid: Some(6),
                },
                RelayAction::ForwardUp {
                    payload: vec![0x03; 3],
                    source: a,
                    destination: MacAddress::broadcast(),
                },
            ]
        );
    }

    #[test]
    fn test_plain_data_uses_address_3() {
        let ap = MacAddress::local(1);
        let a = MacAddress::local(2);
        let registry = registry_with(&[(5, AssociationStatus::Associated)]);

        let actions = relay_frame(
            &ap,
            &registry,
            to_ap(a, MacAddress::local(5), None, vec![0xAA, 0xBB], false),
        )
        .unwrap();
        assert_eq!(
            actions,
            vec![RelayAction::ForwardDown {
                payload: vec![0xAA, 0xBB],
                source: a,
                destination: MacAddress::local(5),
                tid: None,
            }]
        );
    }
}
