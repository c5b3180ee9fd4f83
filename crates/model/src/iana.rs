// Copyright (C) 2024-present The FlowSift Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The IANA "IPFIX Information Elements" registry entries preloaded
//! by [`InfoModel::default_ipfix`](crate::InfoModel::default_ipfix).
//!
//! This is the working set a flow collector needs, not the complete
//! registry; unknown elements encountered on the wire are added on
//! the fly as opaque octet arrays.

use crate::{IEType, VARLEN};

/// `(id, name, type, canonical length)`, pen 0 throughout.
pub const IANA_ELEMENTS: &[(u16, &str, IEType, u16)] = &[
    (1, "octetDeltaCount", IEType::Unsigned64, 8),
    (2, "packetDeltaCount", IEType::Unsigned64, 8),
    (3, "deltaFlowCount", IEType::Unsigned64, 8),
    (4, "protocolIdentifier", IEType::Unsigned8, 1),
    (5, "ipClassOfService", IEType::Unsigned8, 1),
    (6, "tcpControlBits", IEType::Unsigned8, 1),
    (7, "sourceTransportPort", IEType::Unsigned16, 2),
    (8, "sourceIPv4Address", IEType::Ipv4Address, 4),
    (9, "sourceIPv4PrefixLength", IEType::Unsigned8, 1),
    (10, "ingressInterface", IEType::Unsigned32, 4),
    (11, "destinationTransportPort", IEType::Unsigned16, 2),
    (12, "destinationIPv4Address", IEType::Ipv4Address, 4),
    (13, "destinationIPv4PrefixLength", IEType::Unsigned8, 1),
    (14, "egressInterface", IEType::Unsigned32, 4),
    (15, "ipNextHopIPv4Address", IEType::Ipv4Address, 4),
    (16, "bgpSourceAsNumber", IEType::Unsigned32, 4),
    (17, "bgpDestinationAsNumber", IEType::Unsigned32, 4),
    (18, "bgpNextHopIPv4Address", IEType::Ipv4Address, 4),
    (19, "postMCastPacketDeltaCount", IEType::Unsigned64, 8),
    (20, "postMCastOctetDeltaCount", IEType::Unsigned64, 8),
    (21, "flowEndSysUpTime", IEType::Unsigned32, 4),
    (22, "flowStartSysUpTime", IEType::Unsigned32, 4),
    (23, "postOctetDeltaCount", IEType::Unsigned64, 8),
    (24, "postPacketDeltaCount", IEType::Unsigned64, 8),
    (25, "minimumIpTotalLength", IEType::Unsigned64, 8),
    (26, "maximumIpTotalLength", IEType::Unsigned64, 8),
    (27, "sourceIPv6Address", IEType::Ipv6Address, 16),
    (28, "destinationIPv6Address", IEType::Ipv6Address, 16),
    (29, "sourceIPv6PrefixLength", IEType::Unsigned8, 1),
    (30, "destinationIPv6PrefixLength", IEType::Unsigned8, 1),
    (31, "flowLabelIPv6", IEType::Unsigned32, 4),
    (32, "icmpTypeCodeIPv4", IEType::Unsigned16, 2),
    (33, "igmpType", IEType::Unsigned8, 1),
    (36, "flowActiveTimeout", IEType::Unsigned16, 2),
    (37, "flowIdleTimeout", IEType::Unsigned16, 2),
    (40, "exportedOctetTotalCount", IEType::Unsigned64, 8),
    (41, "exportedMessageTotalCount", IEType::Unsigned64, 8),
    (42, "exportedFlowRecordTotalCount", IEType::Unsigned64, 8),
    (44, "sourceIPv4Prefix", IEType::Ipv4Address, 4),
    (45, "destinationIPv4Prefix", IEType::Ipv4Address, 4),
    (46, "mplsTopLabelType", IEType::Unsigned8, 1),
    (47, "mplsTopLabelIPv4Address", IEType::Ipv4Address, 4),
    (48, "samplerId", IEType::Unsigned8, 1),
    (51, "classId", IEType::Unsigned8, 1),
    (52, "minimumTTL", IEType::Unsigned8, 1),
    (53, "maximumTTL", IEType::Unsigned8, 1),
    (54, "fragmentIdentification", IEType::Unsigned32, 4),
    (55, "postIpClassOfService", IEType::Unsigned8, 1),
    (56, "sourceMacAddress", IEType::MacAddress, 6),
    (57, "postDestinationMacAddress", IEType::MacAddress, 6),
    (58, "vlanId", IEType::Unsigned16, 2),
    (59, "postVlanId", IEType::Unsigned16, 2),
    (60, "ipVersion", IEType::Unsigned8, 1),
    (61, "flowDirection", IEType::Unsigned8, 1),
    (62, "ipNextHopIPv6Address", IEType::Ipv6Address, 16),
    (63, "bgpNextHopIPv6Address", IEType::Ipv6Address, 16),
    (64, "ipv6ExtensionHeaders", IEType::Unsigned32, 4),
    (70, "mplsTopLabelStackSection", IEType::OctetArray, VARLEN),
    (71, "mplsLabelStackSection2", IEType::OctetArray, VARLEN),
    (72, "mplsLabelStackSection3", IEType::OctetArray, VARLEN),
    (80, "destinationMacAddress", IEType::MacAddress, 6),
    (81, "postSourceMacAddress", IEType::MacAddress, 6),
    (82, "interfaceName", IEType::String, VARLEN),
    (83, "interfaceDescription", IEType::String, VARLEN),
    (85, "octetTotalCount", IEType::Unsigned64, 8),
    (86, "packetTotalCount", IEType::Unsigned64, 8),
    (88, "fragmentOffset", IEType::Unsigned16, 2),
    (90, "mplsVpnRouteDistinguisher", IEType::OctetArray, VARLEN),
    (91, "mplsTopLabelPrefixLength", IEType::Unsigned8, 1),
    (94, "applicationDescription", IEType::String, VARLEN),
    (95, "applicationId", IEType::OctetArray, VARLEN),
    (96, "applicationName", IEType::String, VARLEN),
    (98, "postIpDiffServCodePoint", IEType::Unsigned8, 1),
    (99, "multicastReplicationFactor", IEType::Unsigned32, 4),
    (101, "classificationEngineId", IEType::Unsigned8, 1),
    (128, "bgpNextAdjacentAsNumber", IEType::Unsigned32, 4),
    (129, "bgpPrevAdjacentAsNumber", IEType::Unsigned32, 4),
    (130, "exporterIPv4Address", IEType::Ipv4Address, 4),
    (131, "exporterIPv6Address", IEType::Ipv6Address, 16),
    (132, "droppedOctetDeltaCount", IEType::Unsigned64, 8),
    (133, "droppedPacketDeltaCount", IEType::Unsigned64, 8),
    (134, "droppedOctetTotalCount", IEType::Unsigned64, 8),
    (135, "droppedPacketTotalCount", IEType::Unsigned64, 8),
    (136, "flowEndReason", IEType::Unsigned8, 1),
    (137, "commonPropertiesId", IEType::Unsigned64, 8),
    (138, "observationPointId", IEType::Unsigned64, 8),
    (139, "icmpTypeCodeIPv6", IEType::Unsigned16, 2),
    (140, "mplsTopLabelIPv6Address", IEType::Ipv6Address, 16),
    (141, "lineCardId", IEType::Unsigned32, 4),
    (142, "portId", IEType::Unsigned32, 4),
    (143, "meteringProcessId", IEType::Unsigned32, 4),
    (144, "exportingProcessId", IEType::Unsigned32, 4),
    (145, "templateId", IEType::Unsigned16, 2),
    (146, "wlanChannelId", IEType::Unsigned8, 1),
    (147, "wlanSSID", IEType::String, VARLEN),
    (148, "flowId", IEType::Unsigned64, 8),
    (149, "observationDomainId", IEType::Unsigned32, 4),
    (150, "flowStartSeconds", IEType::DateTimeSeconds, 4),
    (151, "flowEndSeconds", IEType::DateTimeSeconds, 4),
    (152, "flowStartMilliseconds", IEType::DateTimeMilliseconds, 8),
    (153, "flowEndMilliseconds", IEType::DateTimeMilliseconds, 8),
    (154, "flowStartMicroseconds", IEType::DateTimeMicroseconds, 8),
    (155, "flowEndMicroseconds", IEType::DateTimeMicroseconds, 8),
    (156, "flowStartNanoseconds", IEType::DateTimeNanoseconds, 8),
    (157, "flowEndNanoseconds", IEType::DateTimeNanoseconds, 8),
    (158, "flowStartDeltaMicroseconds", IEType::Unsigned32, 4),
    (159, "flowEndDeltaMicroseconds", IEType::Unsigned32, 4),
    (160, "systemInitTimeMilliseconds", IEType::DateTimeMilliseconds, 8),
    (161, "flowDurationMilliseconds", IEType::Unsigned32, 4),
    (162, "flowDurationMicroseconds", IEType::Unsigned32, 4),
    (163, "observedFlowTotalCount", IEType::Unsigned64, 8),
    (164, "ignoredPacketTotalCount", IEType::Unsigned64, 8),
    (165, "ignoredOctetTotalCount", IEType::Unsigned64, 8),
    (166, "notSentFlowTotalCount", IEType::Unsigned64, 8),
    (167, "notSentPacketTotalCount", IEType::Unsigned64, 8),
    (168, "notSentOctetTotalCount", IEType::Unsigned64, 8),
    (169, "destinationIPv6Prefix", IEType::Ipv6Address, 16),
    (170, "sourceIPv6Prefix", IEType::Ipv6Address, 16),
    (171, "postOctetTotalCount", IEType::Unsigned64, 8),
    (172, "postPacketTotalCount", IEType::Unsigned64, 8),
    (173, "flowKeyIndicator", IEType::Unsigned64, 8),
    (184, "tcpSequenceNumber", IEType::Unsigned32, 4),
    (185, "tcpAcknowledgementNumber", IEType::Unsigned32, 4),
    (186, "tcpWindowSize", IEType::Unsigned16, 2),
    (189, "ipHeaderLength", IEType::Unsigned8, 1),
    (192, "ipTTL", IEType::Unsigned8, 1),
    (210, "paddingOctets", IEType::OctetArray, VARLEN),
    (224, "ipTotalLength", IEType::Unsigned64, 8),
    (225, "postNATSourceIPv4Address", IEType::Ipv4Address, 4),
    (226, "postNATDestinationIPv4Address", IEType::Ipv4Address, 4),
    (227, "postNAPTSourceTransportPort", IEType::Unsigned16, 2),
    (228, "postNAPTDestinationTransportPort", IEType::Unsigned16, 2),
    (233, "firewallEvent", IEType::Unsigned8, 1),
    (234, "ingressVRFID", IEType::Unsigned32, 4),
    (235, "egressVRFID", IEType::Unsigned32, 4),
    (258, "collectionTimeMilliseconds", IEType::DateTimeMilliseconds, 8),
    (276, "dataRecordsReliability", IEType::Boolean, 1),
    (311, "samplingProbability", IEType::Float64, 8),
    (323, "observationTimeMilliseconds", IEType::DateTimeMilliseconds, 8),
    (324, "observationTimeMicroseconds", IEType::DateTimeMicroseconds, 8),
    (325, "observationTimeNanoseconds", IEType::DateTimeNanoseconds, 8),
];
