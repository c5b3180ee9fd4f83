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

//! End-to-end collection over hand-assembled wire streams.

use std::{cell::RefCell, rc::Rc};

use flowsift_collect::{
    BufferSource, ErrorContext, ErrorKind, MessageInfo, MessageStreamParser, PlacementDecoder,
    PlacementSink, PlacementTemplate,
};
use flowsift_model::InfoModel;

/// Assembles one IPFIX message from set payloads.
struct MessageBuilder {
    export_time: u32,
    sequence_number: u32,
    observation_domain: u32,
    sets: Vec<(u16, Vec<u8>)>,
}

impl MessageBuilder {
    fn new(observation_domain: u32) -> Self {
        Self {
            export_time: 1_700_000_000,
            sequence_number: 0,
            observation_domain,
            sets: Vec::new(),
        }
    }

    fn set(mut self, set_id: u16, body: Vec<u8>) -> Self {
        self.sets.push((set_id, body));
        self
    }

    /// A template set with one record.
    fn template(self, template_id: u16, fields: &[(u16, u16)]) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&template_id.to_be_bytes());
        body.extend_from_slice(&(fields.len() as u16).to_be_bytes());
        for &(id, len) in fields {
            body.extend_from_slice(&id.to_be_bytes());
            body.extend_from_slice(&len.to_be_bytes());
        }
        self.set(2, body)
    }

    fn build(&self) -> Vec<u8> {
        let body_len: usize = self.sets.iter().map(|(_, b)| b.len() + 4).sum();
        let mut out = Vec::new();
        out.extend_from_slice(&0x000au16.to_be_bytes());
        out.extend_from_slice(&((16 + body_len) as u16).to_be_bytes());
        out.extend_from_slice(&self.export_time.to_be_bytes());
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
        out.extend_from_slice(&self.observation_domain.to_be_bytes());
        for (id, body) in &self.sets {
            out.extend_from_slice(&id.to_be_bytes());
            out.extend_from_slice(&((body.len() + 4) as u16).to_be_bytes());
            out.extend_from_slice(body);
        }
        out
    }
}

/// Snapshots the bound slots at every `end_placement`.
struct Collector<T: Clone> {
    slot: Rc<dyn Fn() -> T>,
    seen: Vec<T>,
    messages: Vec<MessageInfo>,
}

impl<T: Clone> Collector<T> {
    fn new(read: impl Fn() -> T + 'static) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            slot: Rc::new(read),
            seen: Vec::new(),
            messages: Vec::new(),
        }))
    }
}

impl<T: Clone> PlacementSink for Collector<T> {
    fn start_message(&mut self, message: &MessageInfo) -> Result<(), ErrorContext> {
        self.messages.push(message.clone());
        Ok(())
    }

    fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        let value = (self.slot)();
        self.seen.push(value);
        Ok(())
    }
}

fn run(decoder: &mut PlacementDecoder, wire: &[u8]) -> Result<(), ErrorContext> {
    MessageStreamParser::new().parse(&mut BufferSource::new(wire), decoder)
}

#[test]
fn test_minimal_happy_path() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let sip = template.bind_u32("sourceIPv4Address", &model).unwrap();

    let sink = Collector::new(move || sip.get());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    let wire = MessageBuilder::new(1)
        .template(256, &[(8, 4)])
        .set(256, vec![0xc0, 0xa8, 0x01, 0x01])
        .build();
    run(&mut decoder, &wire).unwrap();

    assert_eq!(sink.borrow().seen, vec![0xc0a8_0101]);
    assert_eq!(
        std::net::Ipv4Addr::from(sink.borrow().seen[0]),
        std::net::Ipv4Addr::new(192, 168, 1, 1)
    );
    assert_eq!(decoder.stats().messages, 1);
    assert_eq!(decoder.stats().data_records, 1);
}

#[test]
fn test_reduced_length_integer() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let packets = template.bind_u64("packetDeltaCount", &model).unwrap();

    let sink = Collector::new(move || packets.get());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    let wire = MessageBuilder::new(1)
        .template(256, &[(2, 2)])
        .set(256, vec![0x01, 0x00])
        .build();
    run(&mut decoder, &wire).unwrap();

    assert_eq!(sink.borrow().seen, vec![256]);
}

#[test]
fn test_varlen_string() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let name = template.bind_octets("applicationName", &model).unwrap();

    let reader = name.clone();
    let sink = Collector::new(move || reader.borrow().as_bytes().to_vec());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    let mut record = vec![0x05];
    record.extend_from_slice(b"HELLO");
    let wire = MessageBuilder::new(1)
        .template(256, &[(96, 0xffff)])
        .set(256, record)
        .build();
    run(&mut decoder, &wire).unwrap();

    assert_eq!(sink.borrow().seen, vec![b"HELLO".to_vec()]);
    assert_eq!(name.borrow().len(), 5);
}

#[test]
fn test_three_byte_length_prefix() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let name = template.bind_octets("applicationName", &model).unwrap();

    let reader = name.clone();
    let sink = Collector::new(move || reader.borrow().len());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    let mut record = vec![0xff, 0x01, 0x00];
    record.extend_from_slice(&[0u8; 256]);
    let wire = MessageBuilder::new(1)
        .template(256, &[(96, 0xffff)])
        .set(256, record)
        .build();
    run(&mut decoder, &wire).unwrap();

    assert_eq!(sink.borrow().seen, vec![256]);
}

#[test]
fn test_unknown_wire_template_skipped() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let packets = template.bind_u64("packetDeltaCount", &model).unwrap();

    let sink = Collector::new(move || packets.get());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    // Data set 999 arrives before any template 999.
    let wire = MessageBuilder::new(1).set(999, vec![1, 2, 3, 4]).build();
    run(&mut decoder, &wire).unwrap();

    assert!(sink.borrow().seen.is_empty());
    assert_eq!(decoder.stats().skipped_unknown_sets, 1);
}

#[test]
fn test_multi_record_sets_and_messages() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let packets = template.bind_u64("packetDeltaCount", &model).unwrap();
    let proto = template.bind_u8("protocolIdentifier", &model).unwrap();

    let reader = packets.clone();
    let sink = Collector::new(move || (reader.get(), proto.get()));
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    // The wire template interleaves an unplaced element.
    let mut records = Vec::new();
    for (count, proto) in [(1u16, 6u8), (2, 17), (3, 1)] {
        records.extend_from_slice(&count.to_be_bytes());
        records.push(0xee); // ipClassOfService, skipped
        records.push(proto);
    }
    let first = MessageBuilder::new(1)
        .template(256, &[(2, 2), (5, 1), (4, 1)])
        .set(256, records)
        .build();
    let second = MessageBuilder::new(1)
        .set(256, vec![0x00, 0x04, 0xee, 0x2f])
        .build();

    let mut wire = first;
    wire.extend(second);
    run(&mut decoder, &wire).unwrap();

    assert_eq!(
        sink.borrow().seen,
        vec![(1, 6), (2, 17), (3, 1), (4, 47)]
    );
    assert_eq!(decoder.stats().messages, 2);
    assert_eq!(sink.borrow().messages.len(), 2);
    assert_eq!(
        sink.borrow().messages[0].export_time.timestamp(),
        1_700_000_000
    );
}

#[test]
fn test_octet_array_reused_across_records() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let ssid = template.bind_octets("wlanSSID", &model).unwrap();

    let reader = ssid.clone();
    let sink = Collector::new(move || reader.borrow().to_string_lossy().into_owned());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    let mut records = Vec::new();
    for s in ["longer-ssid", "ab", "medium"] {
        records.push(s.len() as u8);
        records.extend_from_slice(s.as_bytes());
    }
    let wire = MessageBuilder::new(1)
        .template(256, &[(147, 0xffff)])
        .set(256, records)
        .build();
    run(&mut decoder, &wire).unwrap();

    assert_eq!(sink.borrow().seen, vec!["longer-ssid", "ab", "medium"]);
    // Capacity stuck at the high-water mark.
    assert_eq!(ssid.borrow().capacity(), "longer-ssid".len());
}

#[test]
fn test_template_supersedence_governs_later_sets() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let packets = template.bind_u64("packetDeltaCount", &model).unwrap();

    let sink = Collector::new(move || packets.get());
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    // First layout: bare counter. Second layout shifts it behind an
    // ingressInterface word; the old plan would read garbage.
    let first = MessageBuilder::new(1)
        .template(256, &[(2, 2)])
        .set(256, vec![0x00, 0x07])
        .build();
    let second = MessageBuilder::new(1)
        .template(256, &[(10, 4), (2, 2)])
        .set(256, vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x08])
        .build();

    let mut wire = first;
    wire.extend(second);
    run(&mut decoder, &wire).unwrap();

    assert_eq!(sink.borrow().seen, vec![7, 8]);
    assert_eq!(decoder.stats().templates_superseded, 1);
}

#[test]
fn test_fixed_and_address_elements() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    let mac = template.bind_mac("sourceMacAddress", &model).unwrap();
    let v6 = template.bind_ipv6("sourceIPv6Address", &model).unwrap();

    let reader = mac.clone();
    let v6_reader = v6.clone();
    let sink = Collector::new(move || (reader.get(), v6_reader.get()));
    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), sink.clone());

    let mac_wire = [0x02, 0x11, 0x22, 0x33, 0x44, 0x55];
    let v6_wire = [
        0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x42,
    ];
    let mut record = Vec::new();
    record.extend_from_slice(&mac_wire);
    record.extend_from_slice(&v6_wire);
    let wire = MessageBuilder::new(1)
        .template(256, &[(56, 6), (27, 16)])
        .set(256, record)
        .build();
    run(&mut decoder, &wire).unwrap();

    // Addresses are copied verbatim under the default policy.
    let (seen_mac, seen_v6) = sink.borrow().seen[0];
    assert_eq!(seen_mac, mac_wire);
    assert_eq!(seen_v6, v6_wire);
    assert_eq!(
        std::net::Ipv6Addr::from(seen_v6).to_string(),
        "2001:db8::42"
    );
}

#[test]
fn test_sink_abort_ends_session() {
    struct Quitter;
    impl PlacementSink for Quitter {
        fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
            Err(ErrorContext::aborted("saw enough"))
        }
    }

    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    template.bind_u64("packetDeltaCount", &model).unwrap();

    let mut decoder = PlacementDecoder::new(model);
    decoder.register_placement(Rc::new(template), Rc::new(RefCell::new(Quitter)));

    let wire = MessageBuilder::new(1)
        .template(256, &[(2, 8)])
        .set(256, vec![0u8; 16])
        .build();
    let err = run(&mut decoder, &wire).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AbortedByUser);
    // Only the first record was dispatched.
    assert_eq!(decoder.stats().data_records, 0);
}

#[test]
fn test_truncations_never_panic() {
    let model = InfoModel::default_ipfix();
    let mut template = PlacementTemplate::new();
    template.bind_u64("packetDeltaCount", &model).unwrap();

    let wire = MessageBuilder::new(1)
        .template(256, &[(2, 8), (96, 0xffff)])
        .set(256, {
            let mut r = 5u64.to_be_bytes().to_vec();
            r.extend_from_slice(&[3, b'a', b'b', b'c']);
            r
        })
        .build();

    for cut in 0..wire.len() {
        let mut decoder = PlacementDecoder::new(InfoModel::default_ipfix());
        let result = run(&mut decoder, &wire[..cut]);
        if cut == 0 {
            result.unwrap();
        } else {
            let err = result.unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::ShortHeader | ErrorKind::ShortBody),
                "cut at {cut}: {err}"
            );
        }
    }
}
